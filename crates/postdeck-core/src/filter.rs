use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::calendar;
use crate::model::{Client, Platform, Post, PostStatus};

#[derive(Debug, Clone, PartialEq)]
enum Pred {
    Client(String),
    Status(PostStatus),
    Platform(Platform),
    On(NaiveDate),
    Word(String),
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    preds: Vec<Pred>,
}

impl PostFilter {
    pub fn parse(terms: &[String], now: DateTime<Utc>, tz: Tz) -> Result<PostFilter> {
        let mut preds = Vec::new();
        for term in terms {
            if let Some(value) = term.strip_prefix("client:") {
                preds.push(Pred::Client(value.to_string()));
            } else if let Some(value) = term.strip_prefix("status:") {
                let status = PostStatus::parse(value)
                    .ok_or_else(|| anyhow!("unknown status in filter: {value}"))?;
                preds.push(Pred::Status(status));
            } else if let Some(value) = term.strip_prefix("platform:") {
                let platform = Platform::parse(value)
                    .ok_or_else(|| anyhow!("unknown platform in filter: {value}"))?;
                preds.push(Pred::Platform(platform));
            } else if let Some(value) = term.strip_prefix("on:") {
                preds.push(Pred::On(parse_day_token(value, now, tz)?));
            } else {
                preds.push(Pred::Word(term.to_lowercase()));
            }
        }
        Ok(PostFilter { preds })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    #[must_use]
    pub fn matches(&self, post: &Post, clients: &[Client], tz: Tz) -> bool {
        self.preds.iter().all(|pred| match pred {
            Pred::Client(token) => client_token_matches(token, &post.client_id, clients),
            Pred::Status(status) => post.status == *status,
            Pred::Platform(platform) => post.platforms.contains(platform),
            Pred::On(day) => post.local_date(tz) == *day,
            Pred::Word(word) => post.content.to_lowercase().contains(word),
        })
    }
}

fn client_token_matches(token: &str, client_id: &str, clients: &[Client]) -> bool {
    if token == client_id {
        return true;
    }
    clients
        .iter()
        .any(|client| client.id == client_id && client.name.to_lowercase() == token.to_lowercase())
}

fn parse_day_token(value: &str, now: DateTime<Utc>, tz: Tz) -> Result<NaiveDate> {
    let today = calendar::today_in_zone(now, tz);
    match value.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(calendar::add_days(today, 1)),
        "yesterday" => Ok(calendar::add_days(today, -1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| anyhow!("unrecognized day in filter: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn moscow() -> Tz {
        "Europe/Moscow".parse().expect("valid zone")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
            .single()
            .expect("valid now")
    }

    fn sample_post() -> Post {
        Post {
            id: "3".to_string(),
            client_id: "3".to_string(),
            content: "5 простых медитаций, которые можно делать прямо на рабочем месте".to_string(),
            media: Vec::new(),
            platforms: vec![Platform::Telegram, Platform::Vk],
            scheduled_for: DateTime::parse_from_rfc3339("2025-10-03T08:00:00+03:00")
                .expect("valid timestamp"),
            status: PostStatus::Scheduled,
            created_at: DateTime::parse_from_rfc3339("2025-09-27T14:20:00Z").expect("valid stamp"),
            updated_at: DateTime::parse_from_rfc3339("2025-09-27T16:35:00Z").expect("valid stamp"),
        }
    }

    fn sample_client() -> Client {
        Client {
            id: "3".to_string(),
            name: "Mindful Space".to_string(),
            industry: "Wellness".to_string(),
            logo: None,
            color: "#14B8A6".to_string(),
            social_accounts: Vec::new(),
        }
    }

    fn parse(terms: &[&str]) -> PostFilter {
        let owned: Vec<String> = terms.iter().map(|term| term.to_string()).collect();
        PostFilter::parse(&owned, fixed_now(), moscow()).expect("valid filter")
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = parse(&[]);
        assert!(filter.is_empty());
        assert!(filter.matches(&sample_post(), &[sample_client()], moscow()));
    }

    #[test]
    fn status_and_platform_predicates() {
        let clients = [sample_client()];
        assert!(parse(&["status:scheduled"]).matches(&sample_post(), &clients, moscow()));
        assert!(!parse(&["status:draft"]).matches(&sample_post(), &clients, moscow()));
        assert!(parse(&["platform:vk"]).matches(&sample_post(), &clients, moscow()));
        assert!(!parse(&["platform:instagram"]).matches(&sample_post(), &clients, moscow()));
    }

    #[test]
    fn client_predicate_accepts_id_or_name() {
        let clients = [sample_client()];
        assert!(parse(&["client:3"]).matches(&sample_post(), &clients, moscow()));
        assert!(parse(&["client:mindful space"]).matches(&sample_post(), &clients, moscow()));
        assert!(!parse(&["client:urban"]).matches(&sample_post(), &clients, moscow()));
    }

    #[test]
    fn client_id_matches_without_a_loaded_client() {
        assert!(parse(&["client:3"]).matches(&sample_post(), &[], moscow()));
    }

    #[test]
    fn on_predicate_uses_the_local_day() {
        let clients = [sample_client()];
        assert!(parse(&["on:2025-10-03"]).matches(&sample_post(), &clients, moscow()));
        assert!(!parse(&["on:today"]).matches(&sample_post(), &clients, moscow()));
    }

    #[test]
    fn words_match_content_case_insensitively() {
        let clients = [sample_client()];
        assert!(parse(&["Медитаций"]).matches(&sample_post(), &clients, moscow()));
        assert!(!parse(&["кофе"]).matches(&sample_post(), &clients, moscow()));
    }

    #[test]
    fn conjunction_requires_all_predicates() {
        let clients = [sample_client()];
        assert!(parse(&["client:3", "platform:vk"]).matches(&sample_post(), &clients, moscow()));
        assert!(!parse(&["client:3", "status:draft"]).matches(&sample_post(), &clients, moscow()));
    }

    #[test]
    fn bad_predicate_values_are_errors() {
        let terms = vec!["status:archived".to_string()];
        assert!(PostFilter::parse(&terms, fixed_now(), moscow()).is_err());
        let terms = vec!["on:someday".to_string()];
        assert!(PostFilter::parse(&terms, fixed_now(), moscow()).is_err());
    }
}
