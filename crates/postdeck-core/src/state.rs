use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::calendar::{self, WeekView};
use crate::datastore::Store;
use crate::model::{Client, Post, PostTemplate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Calendar,
    Posts,
    Clients,
    Templates,
}

impl View {
    pub fn parse(token: &str) -> Option<View> {
        match token {
            "calendar" => Some(View::Calendar),
            "posts" => Some(View::Posts),
            "clients" => Some(View::Clients),
            "templates" => Some(View::Templates),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_key(&self) -> &'static str {
        match self {
            View::Calendar => "calendar",
            View::Posts => "posts",
            View::Clients => "clients",
            View::Templates => "templates",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub view: View,
    pub reference_date: Option<NaiveDate>,
    pub selected_clients: Option<BTreeSet<String>>,
}

impl Default for Session {
    fn default() -> Session {
        Session {
            view: View::Calendar,
            reference_date: None,
            selected_clients: None,
        }
    }
}

impl Session {
    pub fn load(path: &Path) -> Session {
        if !path.exists() {
            return Session::default();
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "failed to read session file");
                return Session::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(%err, path = %path.display(), "ignoring corrupt session file");
                Session::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("no parent directory for {}", path.display()))?;
        let tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
        fs::write(tmp.path(), raw)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tmp.persist(path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub clients: Vec<Client>,
    pub posts: Vec<Post>,
    pub templates: Vec<PostTemplate>,
    pub selected_clients: Option<BTreeSet<String>>,
    pub reference_date: NaiveDate,
}

impl AppState {
    pub fn load(store: &Store, session: &Session, today: NaiveDate) -> Result<AppState> {
        let clients = store.list_clients()?;
        let posts = store.list_posts()?;
        let templates = store.list_templates()?;
        tracing::debug!(
            clients = clients.len(),
            posts = posts.len(),
            templates = templates.len(),
            "loaded workspace"
        );
        Ok(AppState {
            clients,
            posts,
            templates,
            selected_clients: session.selected_clients.clone(),
            reference_date: session.reference_date.unwrap_or(today),
        })
    }

    #[must_use]
    pub fn selection(&self) -> BTreeSet<String> {
        match &self.selected_clients {
            Some(ids) => ids.clone(),
            None => self
                .clients
                .iter()
                .map(|client| client.id.clone())
                .collect(),
        }
    }

    #[must_use]
    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|client| client.id == id)
    }

    #[must_use]
    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    #[must_use]
    pub fn template(&self, id: &str) -> Option<&PostTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    #[must_use]
    pub fn week(&self, today: NaiveDate, tz: Tz, week_start: Weekday) -> WeekView<'_> {
        calendar::week_view(
            &self.posts,
            &self.selection(),
            self.reference_date,
            today,
            tz,
            week_start,
        )
    }

    #[must_use]
    pub fn with_client_added(mut self, client: Client) -> AppState {
        self.clients.push(client);
        self
    }

    #[must_use]
    pub fn with_client_updated(mut self, client: Client) -> AppState {
        if let Some(slot) = self.clients.iter_mut().find(|c| c.id == client.id) {
            *slot = client;
        }
        self
    }

    #[must_use]
    pub fn with_client_removed(mut self, id: &str) -> AppState {
        self.clients.retain(|client| client.id != id);
        self
    }

    #[must_use]
    pub fn with_post_added(mut self, post: Post) -> AppState {
        self.posts.push(post);
        self
    }

    #[must_use]
    pub fn with_post_updated(mut self, post: Post) -> AppState {
        if let Some(slot) = self.posts.iter_mut().find(|p| p.id == post.id) {
            *slot = post;
        }
        self
    }

    #[must_use]
    pub fn with_post_removed(mut self, id: &str) -> AppState {
        self.posts.retain(|post| post.id != id);
        self
    }

    #[must_use]
    pub fn with_template_added(mut self, template: PostTemplate) -> AppState {
        self.templates.push(template);
        self
    }

    #[must_use]
    pub fn with_template_removed(mut self, id: &str) -> AppState {
        self.templates.retain(|template| template.id != id);
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Option<BTreeSet<String>>) -> AppState {
        self.selected_clients = selection;
        self
    }

    #[must_use]
    pub fn with_selection_toggled(mut self, id: &str) -> AppState {
        let mut ids = self.selection();
        if !ids.remove(id) {
            ids.insert(id.to_string());
        }
        self.selected_clients = Some(ids);
        self
    }

    #[must_use]
    pub fn with_reference_date(mut self, date: NaiveDate) -> AppState {
        self.reference_date = date;
        self
    }

    #[must_use]
    pub fn with_week_shifted(self, weeks: i64) -> AppState {
        let date = calendar::add_days(self.reference_date, weeks * 7);
        self.with_reference_date(date)
    }

    #[must_use]
    pub fn session(&self, view: View) -> Session {
        Session {
            view,
            reference_date: Some(self.reference_date),
            selected_clients: self.selected_clients.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Platform, Post, PostStatus};
    use chrono::DateTime;
    use tempfile::tempdir;

    fn client(id: &str, name: &str) -> Client {
        Client {
            id: id.to_string(),
            name: name.to_string(),
            industry: "Food & Beverage".to_string(),
            logo: None,
            color: "#F97316".to_string(),
            social_accounts: Vec::new(),
        }
    }

    fn post(id: &str, client_id: &str) -> Post {
        Post {
            id: id.to_string(),
            client_id: client_id.to_string(),
            content: format!("post {id}"),
            media: Vec::new(),
            platforms: vec![Platform::Telegram],
            scheduled_for: DateTime::parse_from_rfc3339("2025-10-01T12:00:00+03:00")
                .expect("valid timestamp"),
            status: PostStatus::Scheduled,
            created_at: DateTime::parse_from_rfc3339("2025-09-25T10:30:00Z").expect("valid stamp"),
            updated_at: DateTime::parse_from_rfc3339("2025-09-25T10:30:00Z").expect("valid stamp"),
        }
    }

    fn sample_state() -> AppState {
        AppState {
            clients: vec![client("1", "Aesthetic Cafe"), client("2", "Urban Clothing")],
            posts: vec![post("1", "1"), post("2", "2")],
            templates: Vec::new(),
            selected_clients: None,
            reference_date: NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date"),
        }
    }

    #[test]
    fn absent_selection_means_all_loaded_clients() {
        let state = sample_state();
        let selection = state.selection();
        assert!(selection.contains("1"));
        assert!(selection.contains("2"));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn toggling_materializes_the_selection() {
        let state = sample_state().with_selection_toggled("2");
        let selection = state.selection();
        assert!(selection.contains("1"));
        assert!(!selection.contains("2"));

        let state = state.with_selection_toggled("2");
        assert_eq!(state.selection().len(), 2);
    }

    #[test]
    fn dynamic_selection_includes_clients_added_later() {
        let state = sample_state().with_client_added(client("3", "Mindful Space"));
        assert!(state.selection().contains("3"));
    }

    #[test]
    fn week_shift_moves_the_reference_by_seven_days() {
        let state = sample_state().with_week_shifted(1);
        assert_eq!(
            state.reference_date,
            NaiveDate::from_ymd_opt(2025, 10, 8).expect("valid date")
        );
        let state = state.with_week_shifted(-2);
        assert_eq!(
            state.reference_date,
            NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date")
        );
    }

    #[test]
    fn updates_and_removals_replace_matching_records() {
        let mut updated = post("2", "2");
        updated.content = "rewritten".to_string();
        let state = sample_state().with_post_updated(updated);
        assert_eq!(state.post("2").expect("post kept").content, "rewritten");

        let state = state.with_post_removed("1");
        assert!(state.post("1").is_none());
        assert_eq!(state.posts.len(), 1);
    }

    #[test]
    fn session_round_trips_through_the_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.json");

        let state = sample_state().with_selection_toggled("2");
        state.session(View::Posts).save(&path).expect("save session");

        let restored = Session::load(&path);
        assert_eq!(restored.view, View::Posts);
        assert_eq!(
            restored.reference_date,
            Some(NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date"))
        );
        let selection = restored.selected_clients.expect("materialized selection");
        assert!(selection.contains("1"));
        assert!(!selection.contains("2"));
    }

    #[test]
    fn corrupt_session_files_fall_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").expect("write garbage");

        let session = Session::load(&path);
        assert_eq!(session.view, View::Calendar);
        assert!(session.reference_date.is_none());
        assert!(session.selected_clients.is_none());
    }
}
