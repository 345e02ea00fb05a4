use anyhow::{Context, anyhow};
use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

pub const LOCAL_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const DEFAULT_POST_HOUR: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time zone id: {id}")]
pub struct InvalidTimeZone {
    pub id: String,
}

pub fn parse_timezone(id: &str) -> Result<Tz, InvalidTimeZone> {
    let trimmed = id.trim();
    trimmed.parse::<Tz>().map_err(|_| InvalidTimeZone {
        id: trimmed.to_string(),
    })
}

pub fn resolve_timezone(configured: Option<&str>) -> Result<Tz, InvalidTimeZone> {
    if let Some(id) = configured {
        let tz = parse_timezone(id)?;
        tracing::info!(timezone = %tz, "using configured time zone");
        return Ok(tz);
    }

    match iana_time_zone::get_timezone() {
        Ok(id) => match id.parse::<Tz>() {
            Ok(tz) => {
                tracing::debug!(timezone = %tz, "using environment time zone");
                Ok(tz)
            }
            Err(_) => {
                tracing::warn!(
                    timezone = %id,
                    "environment reported an unknown time zone; using UTC"
                );
                Ok(chrono_tz::UTC)
            }
        },
        Err(error) => {
            tracing::warn!(%error, "could not determine environment time zone; using UTC");
            Ok(chrono_tz::UTC)
        }
    }
}

#[must_use]
pub fn format_local_iso(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format(LOCAL_ISO_FORMAT)
        .to_string()
}

pub fn format_local_iso_in(instant: DateTime<Utc>, zone_id: &str) -> Result<String, InvalidTimeZone> {
    Ok(format_local_iso(instant, parse_timezone(zone_id)?))
}

#[must_use]
pub fn format_offset_iso(value: DateTime<FixedOffset>) -> String {
    value.format(LOCAL_ISO_FORMAT).to_string()
}

#[tracing::instrument(skip(now, tz), fields(input = input))]
pub fn parse_schedule_expr(
    input: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> anyhow::Result<DateTime<FixedOffset>> {
    let token = input.trim();
    let lower = token.to_ascii_lowercase();
    let local_now = now.with_timezone(&tz);

    match lower.as_str() {
        "now" => return Ok(local_now.fixed_offset()),
        "today" => {
            return at_time(local_now.date_naive(), DEFAULT_POST_HOUR, 0, tz);
        }
        "tomorrow" => {
            let date = local_now
                .date_naive()
                .succ_opt()
                .ok_or_else(|| anyhow!("failed to advance to tomorrow"))?;
            return at_time(date, DEFAULT_POST_HOUR, 0, tz);
        }
        _ => {}
    }

    if let Some((hour, minute)) = parse_clock_time(token) {
        let day = local_now.date_naive();
        let candidate = at_time(day, hour, minute, tz)?;
        if candidate > local_now.fixed_offset() {
            return Ok(candidate);
        }
        let next_day = day
            .succ_opt()
            .ok_or_else(|| anyhow!("failed to advance to the next day"))?;
        return at_time(next_day, hour, minute, tz);
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return at_time(date, DEFAULT_POST_HOUR, 0, tz);
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
            return resolve_local(naive, tz);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(token) {
        return Ok(parsed.with_timezone(&tz).fixed_offset());
    }

    Err(anyhow!("unrecognized schedule expression: {token}")).context(
        "supported forms: now, today, tomorrow, HH:MM, YYYY-MM-DD, YYYY-MM-DD HH:MM, RFC 3339",
    )
}

fn at_time(date: NaiveDate, hour: u32, minute: u32, tz: Tz) -> anyhow::Result<DateTime<FixedOffset>> {
    let naive = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow!("failed to construct local time {hour:02}:{minute:02}"))?;
    resolve_local(naive, tz)
}

fn resolve_local(naive: NaiveDateTime, tz: Tz) -> anyhow::Result<DateTime<FixedOffset>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(resolved) => Ok(resolved.fixed_offset()),
        LocalResult::Ambiguous(first, second) => {
            tracing::warn!(
                %naive,
                first = %first,
                second = %second,
                "ambiguous local datetime; using earliest"
            );
            let chosen = if first <= second { first } else { second };
            Ok(chosen.fixed_offset())
        }
        LocalResult::None => Err(anyhow!("local datetime {naive} does not exist in {tz}")),
    }
}

fn parse_clock_time(token: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap]m)?$").ok()?;
    let caps = re.captures(token)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    if minute > 59 {
        return None;
    }
    match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(suffix) if suffix.starts_with('a') => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour == 12 {
                hour = 0;
            }
        }
        Some(suffix) if suffix.starts_with('p') => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour != 12 {
                hour += 12;
            }
        }
        _ => {
            if hour > 23 {
                return None;
            }
        }
    }
    Some((hour, minute))
}

pub mod offset_datetime_serde {
    use chrono::{DateTime, FixedOffset};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::LOCAL_ISO_FORMAT;

    pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(LOCAL_ISO_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(
            value: &Option<DateTime<FixedOffset>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(inner) => super::serialize(inner, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(
            deserializer: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map(Some)
                    .map_err(D::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 10, 0, 0)
            .single()
            .expect("valid now")
    }

    fn moscow() -> Tz {
        "Europe/Moscow".parse().expect("valid zone")
    }

    fn new_york() -> Tz {
        "America/New_York".parse().expect("valid zone")
    }

    #[test]
    fn formats_wall_clock_with_zone_offset() {
        let instant = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid instant");
        let formatted = format_local_iso_in(instant, "Europe/Moscow").expect("known zone");
        assert_eq!(formatted, "2024-01-01T03:00:00+03:00");
    }

    #[test]
    fn offsets_follow_dst() {
        let summer = Utc
            .with_ymd_and_hms(2025, 7, 1, 12, 0, 0)
            .single()
            .expect("valid instant");
        let winter = Utc
            .with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
            .single()
            .expect("valid instant");
        assert!(format_local_iso(summer, new_york()).ends_with("-04:00"));
        assert!(format_local_iso(winter, new_york()).ends_with("-05:00"));
    }

    #[test]
    fn unknown_zone_id_is_an_error() {
        let instant = fixed_now();
        let err = format_local_iso_in(instant, "Mars/Olympus").expect_err("bad zone");
        assert_eq!(err.id, "Mars/Olympus");
        assert!(resolve_timezone(Some("Not/AZone")).is_err());
    }

    #[test]
    fn date_expr_defaults_to_noon() {
        let scheduled =
            parse_schedule_expr("2025-10-06", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(scheduled), "2025-10-06T12:00:00+03:00");
    }

    #[test]
    fn datetime_expr_keeps_wall_clock() {
        let scheduled =
            parse_schedule_expr("2025-10-07T15:30", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(scheduled), "2025-10-07T15:30:00+03:00");
    }

    #[test]
    fn rfc3339_is_reexpressed_in_zone() {
        let scheduled =
            parse_schedule_expr("2025-10-01T12:00:00Z", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(scheduled), "2025-10-01T15:00:00+03:00");
    }

    #[test]
    fn clock_time_picks_next_occurrence() {
        let past = parse_schedule_expr("08:00", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(past), "2025-10-02T08:00:00+03:00");

        let future = parse_schedule_expr("15:00", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(future), "2025-10-01T15:00:00+03:00");

        let afternoon = parse_schedule_expr("2:30pm", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(afternoon), "2025-10-01T14:30:00+03:00");
    }

    #[test]
    fn named_days_schedule_at_noon() {
        let today = parse_schedule_expr("today", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(today), "2025-10-01T12:00:00+03:00");

        let tomorrow = parse_schedule_expr("tomorrow", fixed_now(), moscow()).expect("valid expr");
        assert_eq!(format_offset_iso(tomorrow), "2025-10-02T12:00:00+03:00");
    }

    #[test]
    fn nonexistent_local_time_is_an_error() {
        assert!(parse_schedule_expr("2025-03-09T02:30", fixed_now(), new_york()).is_err());
    }

    #[test]
    fn ambiguous_local_time_uses_earliest_offset() {
        let folded =
            parse_schedule_expr("2025-11-02T01:30", fixed_now(), new_york()).expect("valid expr");
        assert_eq!(format_offset_iso(folded), "2025-11-02T01:30:00-04:00");
    }

    #[test]
    fn unrecognized_expression_is_an_error() {
        assert!(parse_schedule_expr("someday", fixed_now(), moscow()).is_err());
    }
}
