use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::datetime::offset_datetime_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Vk,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Telegram, Platform::Vk, Platform::Instagram];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Telegram => "telegram",
            Platform::Vk => "vk",
            Platform::Instagram => "instagram",
        }
    }

    #[must_use]
    pub fn parse(input: &str) -> Option<Platform> {
        match input.trim().to_ascii_lowercase().as_str() {
            "telegram" => Some(Platform::Telegram),
            "vk" => Some(Platform::Vk),
            "instagram" => Some(Platform::Instagram),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }

    #[must_use]
    pub fn parse(input: &str) -> Option<PostStatus> {
        match input.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(PostStatus::Draft),
            "scheduled" => Some(PostStatus::Scheduled),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccount {
    pub id: String,
    pub platform: Platform,
    pub handle: String,
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub industry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub color: String,
    #[serde(default)]
    pub social_accounts: Vec<SocialAccount>,
}

impl Client {
    #[must_use]
    pub fn connected_platforms(&self) -> Vec<Platform> {
        let mut platforms = Vec::new();
        for account in &self.social_accounts {
            if account.connected && !platforms.contains(&account.platform) {
                platforms.push(account.platform);
            }
        }
        platforms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub client_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
    pub platforms: Vec<Platform>,
    #[serde(with = "offset_datetime_serde")]
    pub scheduled_for: DateTime<FixedOffset>,
    pub status: PostStatus,
    #[serde(with = "offset_datetime_serde")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "offset_datetime_serde")]
    pub updated_at: DateTime<FixedOffset>,
}

impl Post {
    #[must_use]
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        self.scheduled_for.with_timezone(&tz).date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTemplate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    pub industry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub color: String,
    pub social_accounts: Vec<SocialAccount>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_accounts: Option<Vec<SocialAccount>>,
}

impl ClientPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.industry.is_none()
            && self.logo.is_none()
            && self.color.is_none()
            && self.social_accounts.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct PostDraft {
    pub client_id: String,
    pub content: String,
    pub media: Vec<String>,
    pub platforms: Vec<Platform>,
    pub scheduled_for: DateTime<FixedOffset>,
    pub status: PostStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub client_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
    pub platforms: Vec<Platform>,
    #[serde(with = "offset_datetime_serde")]
    pub scheduled_for: DateTime<FixedOffset>,
    pub status: PostStatus,
    #[serde(with = "offset_datetime_serde")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "offset_datetime_serde")]
    pub updated_at: DateTime<FixedOffset>,
}

impl NewPost {
    #[must_use]
    pub fn from_draft(draft: PostDraft, now: DateTime<FixedOffset>) -> NewPost {
        NewPost {
            client_id: draft.client_id,
            content: draft.content,
            media: draft.media,
            platforms: draft.platforms,
            scheduled_for: draft.scheduled_for,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<Platform>>,
    #[serde(
        with = "offset_datetime_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_for: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(
        with = "offset_datetime_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl PostPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.content.is_none()
            && self.media.is_none()
            && self.platforms.is_none()
            && self.scheduled_for.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}
