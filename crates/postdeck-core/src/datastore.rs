use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::api::RestClient;
use crate::config::Config;
use crate::model::{
    Client, ClientPatch, NewClient, NewPost, NewTemplate, Platform, Post, PostPatch, PostStatus,
    PostTemplate, SocialAccount,
};

pub enum Store {
    Api(RestClient),
    Local(LocalStore),
}

impl Store {
    pub fn open(cfg: &Config, data_dir: &Path) -> Result<Store> {
        match cfg.data.backend.as_str() {
            "api" => {
                let client = RestClient::new(&cfg.api.base, cfg.api.token.as_deref())?;
                tracing::info!(base = %cfg.api.base, "using REST datastore");
                Ok(Store::Api(client))
            }
            "local" => Ok(Store::Local(LocalStore::open(data_dir)?)),
            other => bail!("unknown data backend: {other} (expected \"local\" or \"api\")"),
        }
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        match self {
            Store::Api(api) => api.list_clients(),
            Store::Local(local) => local.list_clients(),
        }
    }

    pub fn create_client(&self, draft: &NewClient) -> Result<Client> {
        match self {
            Store::Api(api) => api.create_client(draft),
            Store::Local(local) => local.create_client(draft),
        }
    }

    pub fn update_client(&self, id: &str, patch: &ClientPatch) -> Result<Client> {
        match self {
            Store::Api(api) => api.update_client(id, patch),
            Store::Local(local) => local.update_client(id, patch),
        }
    }

    pub fn delete_client(&self, id: &str) -> Result<()> {
        match self {
            Store::Api(api) => api.delete_client(id),
            Store::Local(local) => local.delete_client(id),
        }
    }

    pub fn list_posts(&self) -> Result<Vec<Post>> {
        match self {
            Store::Api(api) => api.list_posts(),
            Store::Local(local) => local.list_posts(),
        }
    }

    pub fn create_post(&self, draft: &NewPost) -> Result<Post> {
        match self {
            Store::Api(api) => api.create_post(draft),
            Store::Local(local) => local.create_post(draft),
        }
    }

    pub fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post> {
        match self {
            Store::Api(api) => api.update_post(id, patch),
            Store::Local(local) => local.update_post(id, patch),
        }
    }

    pub fn delete_post(&self, id: &str) -> Result<()> {
        match self {
            Store::Api(api) => api.delete_post(id),
            Store::Local(local) => local.delete_post(id),
        }
    }

    pub fn list_templates(&self) -> Result<Vec<PostTemplate>> {
        match self {
            Store::Api(api) => api.list_templates(),
            Store::Local(local) => local.list_templates(),
        }
    }

    pub fn create_template(&self, draft: &NewTemplate) -> Result<PostTemplate> {
        match self {
            Store::Api(api) => api.create_template(draft),
            Store::Local(local) => local.create_template(draft),
        }
    }

    pub fn delete_template(&self, id: &str) -> Result<()> {
        match self {
            Store::Api(api) => api.delete_template(id),
            Store::Local(local) => local.delete_template(id),
        }
    }
}

pub struct LocalStore {
    clients_path: PathBuf,
    posts_path: PathBuf,
    templates_path: PathBuf,
}

impl LocalStore {
    pub fn open(data_dir: &Path) -> Result<LocalStore> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        let store = LocalStore {
            clients_path: data_dir.join("clients.data"),
            posts_path: data_dir.join("posts.data"),
            templates_path: data_dir.join("templates.data"),
        };
        store.seed_if_missing()?;
        tracing::info!(
            clients = %store.clients_path.display(),
            posts = %store.posts_path.display(),
            templates = %store.templates_path.display(),
            "opened local datastore"
        );
        Ok(store)
    }

    fn seed_if_missing(&self) -> Result<()> {
        let fresh = !self.clients_path.exists()
            && !self.posts_path.exists()
            && !self.templates_path.exists();
        if fresh {
            tracing::info!("seeding local datastore with sample data");
            save_jsonl(&self.clients_path, &seed_clients())?;
            save_jsonl(&self.posts_path, &seed_posts()?)?;
            save_jsonl(&self.templates_path, &seed_templates())?;
            return Ok(());
        }
        for path in [&self.clients_path, &self.posts_path, &self.templates_path] {
            if !path.exists() {
                fs::File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
            }
        }
        Ok(())
    }

    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let mut clients = self.raw_clients()?;
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    pub fn create_client(&self, draft: &NewClient) -> Result<Client> {
        let mut clients = self.raw_clients()?;
        let id = next_id(clients.iter().map(|client| client.id.as_str()));
        let client = Client {
            id,
            name: draft.name.clone(),
            industry: draft.industry.clone(),
            logo: draft.logo.clone(),
            color: draft.color.clone(),
            social_accounts: draft.social_accounts.clone(),
        };
        clients.push(client.clone());
        save_jsonl(&self.clients_path, &clients)?;
        Ok(client)
    }

    pub fn update_client(&self, id: &str, patch: &ClientPatch) -> Result<Client> {
        let mut clients = self.raw_clients()?;
        let slot = clients
            .iter_mut()
            .find(|client| client.id == id)
            .ok_or_else(|| anyhow!("no client with id {id}"))?;
        if let Some(name) = &patch.name {
            slot.name = name.clone();
        }
        if let Some(industry) = &patch.industry {
            slot.industry = industry.clone();
        }
        if let Some(logo) = &patch.logo {
            slot.logo = Some(logo.clone());
        }
        if let Some(color) = &patch.color {
            slot.color = color.clone();
        }
        if let Some(accounts) = &patch.social_accounts {
            slot.social_accounts = accounts.clone();
        }
        let updated = slot.clone();
        save_jsonl(&self.clients_path, &clients)?;
        Ok(updated)
    }

    pub fn delete_client(&self, id: &str) -> Result<()> {
        let mut clients = self.raw_clients()?;
        let before = clients.len();
        clients.retain(|client| client.id != id);
        if clients.len() == before {
            bail!("no client with id {id}");
        }
        save_jsonl(&self.clients_path, &clients)
    }

    pub fn list_posts(&self) -> Result<Vec<Post>> {
        let mut posts = self.raw_posts()?;
        posts.sort_by_key(|post| post.scheduled_for);
        Ok(posts)
    }

    pub fn create_post(&self, draft: &NewPost) -> Result<Post> {
        let mut posts = self.raw_posts()?;
        let id = next_id(posts.iter().map(|post| post.id.as_str()));
        let post = Post {
            id,
            client_id: draft.client_id.clone(),
            content: draft.content.clone(),
            media: draft.media.clone(),
            platforms: draft.platforms.clone(),
            scheduled_for: draft.scheduled_for,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        };
        posts.push(post.clone());
        save_jsonl(&self.posts_path, &posts)?;
        Ok(post)
    }

    pub fn update_post(&self, id: &str, patch: &PostPatch) -> Result<Post> {
        let mut posts = self.raw_posts()?;
        let slot = posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or_else(|| anyhow!("no post with id {id}"))?;
        if let Some(client_id) = &patch.client_id {
            slot.client_id = client_id.clone();
        }
        if let Some(content) = &patch.content {
            slot.content = content.clone();
        }
        if let Some(media) = &patch.media {
            slot.media = media.clone();
        }
        if let Some(platforms) = &patch.platforms {
            slot.platforms = platforms.clone();
        }
        if let Some(scheduled_for) = patch.scheduled_for {
            slot.scheduled_for = scheduled_for;
        }
        if let Some(status) = patch.status {
            slot.status = status;
        }
        if let Some(updated_at) = patch.updated_at {
            slot.updated_at = updated_at;
        }
        let updated = slot.clone();
        save_jsonl(&self.posts_path, &posts)?;
        Ok(updated)
    }

    pub fn delete_post(&self, id: &str) -> Result<()> {
        let mut posts = self.raw_posts()?;
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            bail!("no post with id {id}");
        }
        save_jsonl(&self.posts_path, &posts)
    }

    pub fn list_templates(&self) -> Result<Vec<PostTemplate>> {
        load_jsonl(&self.templates_path)
    }

    pub fn create_template(&self, draft: &NewTemplate) -> Result<PostTemplate> {
        let mut templates = self.list_templates()?;
        let id = next_id(templates.iter().map(|template| template.id.as_str()));
        let template = PostTemplate {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            content: draft.content.clone(),
            industry: draft.industry.clone(),
        };
        templates.push(template.clone());
        save_jsonl(&self.templates_path, &templates)?;
        Ok(template)
    }

    pub fn delete_template(&self, id: &str) -> Result<()> {
        let mut templates = self.list_templates()?;
        let before = templates.len();
        templates.retain(|template| template.id != id);
        if templates.len() == before {
            bail!("no template with id {id}");
        }
        save_jsonl(&self.templates_path, &templates)
    }

    fn raw_clients(&self) -> Result<Vec<Client>> {
        load_jsonl(&self.clients_path).context("failed to load clients.data")
    }

    fn raw_posts(&self) -> Result<Vec<Post>> {
        load_jsonl(&self.posts_path).context("failed to load posts.data")
    }
}

fn next_id<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let max = ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0);
    (max + 1).to_string()
}

fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("failed parsing {} line {}", path.display(), index + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn save_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("no parent directory for {}", path.display()))?;
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    for record in records {
        let line = serde_json::to_string(record)
            .with_context(|| format!("failed serializing record for {}", path.display()))?;
        writeln!(tmp, "{line}").with_context(|| format!("failed writing {}", path.display()))?;
    }
    tmp.flush()
        .with_context(|| format!("failed flushing {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;
    Ok(())
}

fn seed_instant(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).with_context(|| format!("invalid seed timestamp {raw}"))
}

fn account(
    id: &str,
    platform: Platform,
    handle: &str,
    connected: bool,
    account_name: Option<&str>,
) -> SocialAccount {
    SocialAccount {
        id: id.to_string(),
        platform,
        handle: handle.to_string(),
        connected,
        account_name: account_name.map(str::to_string),
    }
}

fn seed_clients() -> Vec<Client> {
    vec![
        Client {
            id: "1".to_string(),
            name: "Aesthetic Cafe".to_string(),
            industry: "Food & Beverage".to_string(),
            logo: Some(
                "https://images.pexels.com/photos/1855214/pexels-photo-1855214.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
                    .to_string(),
            ),
            color: "#F97316".to_string(),
            social_accounts: vec![
                account("101", Platform::Telegram, "@aestheticcafe", true, Some("Aesthetic Cafe")),
                account("102", Platform::Instagram, "@aesthetic.cafe", true, Some("Aesthetic Cafe")),
            ],
        },
        Client {
            id: "2".to_string(),
            name: "Urban Clothing".to_string(),
            industry: "Fashion".to_string(),
            logo: Some(
                "https://images.pexels.com/photos/5709661/pexels-photo-5709661.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
                    .to_string(),
            ),
            color: "#0EA5E9".to_string(),
            social_accounts: vec![
                account("201", Platform::Vk, "urbanclothing", true, Some("Urban Clothing Co.")),
                account("202", Platform::Instagram, "@urban.clothing", true, Some("Urban Clothing")),
            ],
        },
        Client {
            id: "3".to_string(),
            name: "Mindful Space".to_string(),
            industry: "Wellness".to_string(),
            logo: Some(
                "https://images.pexels.com/photos/3560044/pexels-photo-3560044.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
                    .to_string(),
            ),
            color: "#14B8A6".to_string(),
            social_accounts: vec![
                account("301", Platform::Telegram, "@mindfulspace", true, Some("Mindful Space")),
                account("302", Platform::Vk, "mindfulspace", false, None),
                account("303", Platform::Instagram, "@mindful.space", true, Some("Mindful Space")),
            ],
        },
    ]
}

fn seed_posts() -> Result<Vec<Post>> {
    Ok(vec![
        Post {
            id: "1".to_string(),
            client_id: "1".to_string(),
            content: "Сегодня в нашем кафе новое сезонное меню! Приходите попробовать наши фирменные десерты с тыквой и специями 🍂"
                .to_string(),
            media: vec![
                "https://images.pexels.com/photos/1055272/pexels-photo-1055272.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
                    .to_string(),
            ],
            platforms: vec![Platform::Telegram, Platform::Instagram],
            scheduled_for: seed_instant("2025-10-01T12:00:00+03:00")?,
            status: PostStatus::Scheduled,
            created_at: seed_instant("2025-09-25T10:30:00Z")?,
            updated_at: seed_instant("2025-09-25T11:45:00Z")?,
        },
        Post {
            id: "2".to_string(),
            client_id: "2".to_string(),
            content: "Новая коллекция уже в магазинах! Используйте промокод URBAN25 для скидки 15% на все товары до конца недели 👕"
                .to_string(),
            media: vec![
                "https://images.pexels.com/photos/5709661/pexels-photo-5709661.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
                    .to_string(),
            ],
            platforms: vec![Platform::Vk, Platform::Instagram],
            scheduled_for: seed_instant("2025-10-02T15:00:00+03:00")?,
            status: PostStatus::Draft,
            created_at: seed_instant("2025-09-26T09:15:00Z")?,
            updated_at: seed_instant("2025-09-26T09:15:00Z")?,
        },
        Post {
            id: "3".to_string(),
            client_id: "3".to_string(),
            content: "5 простых медитаций, которые можно делать прямо на рабочем месте. Сохраняйте, чтобы не потерять 🧘‍♀️"
                .to_string(),
            media: vec![
                "https://images.pexels.com/photos/3560044/pexels-photo-3560044.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2"
                    .to_string(),
            ],
            platforms: vec![Platform::Telegram, Platform::Vk, Platform::Instagram],
            scheduled_for: seed_instant("2025-10-03T08:00:00+03:00")?,
            status: PostStatus::Scheduled,
            created_at: seed_instant("2025-09-27T14:20:00Z")?,
            updated_at: seed_instant("2025-09-27T16:35:00Z")?,
        },
    ])
}

fn seed_templates() -> Vec<PostTemplate> {
    vec![
        PostTemplate {
            id: "1".to_string(),
            title: "Новинка".to_string(),
            description: "Анонс нового продукта или услуги".to_string(),
            content: "Мы рады представить вам нашу новинку — [НАЗВАНИЕ]! [ОПИСАНИЕ ПРОДУКТА/УСЛУГИ]. Доступно уже сейчас по цене [ЦЕНА]. Успейте попробовать первыми!"
                .to_string(),
            industry: Some("all".to_string()),
        },
        PostTemplate {
            id: "2".to_string(),
            title: "Совет эксперта".to_string(),
            description: "Профессиональный совет по теме".to_string(),
            content: "[ЧИСЛО] [СОВЕТОВ/РЕКОМЕНДАЦИЙ] от наших экспертов, как [ДЕЙСТВИЕ/РЕЗУЛЬТАТ]. [КРАТКОЕ ОПИСАНИЕ]. Сохраняйте этот пост, чтобы не потерять!"
                .to_string(),
            industry: Some("all".to_string()),
        },
        PostTemplate {
            id: "3".to_string(),
            title: "Закулисье".to_string(),
            description: "Показ процесса работы".to_string(),
            content: "А вы знали, как мы [ПРОЦЕСС]? Сегодня приоткрываем завесу тайны и показываем, что происходит за кулисами. [ОПИСАНИЕ ПРОЦЕССА]"
                .to_string(),
            industry: Some("all".to_string()),
        },
    ]
}
