use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Weekday;
use serde::Deserialize;

pub const CONFIG_ENV: &str = "POSTDECK_CONFIG";
pub const TIMEZONE_ENV: &str = "POSTDECK_TIMEZONE";

fn default_color() -> String {
    "on".to_string()
}

fn default_command() -> String {
    "calendar".to_string()
}

fn default_data_location() -> String {
    "~/.postdeck".to_string()
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_api_base() -> String {
    "http://127.0.0.1:3001/api".to_string()
}

fn default_week_start() -> String {
    "monday".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_command")]
    pub default_command: String,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_location")]
    pub location: String,
    #[serde(default = "default_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base: String,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_week_start")]
    pub week_start: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timezone: None,
            color: default_color(),
            default_command: default_command(),
            data: DataConfig::default(),
            api: ApiConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            location: default_data_location(),
            backend: default_backend(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base: default_api_base(),
            token: None,
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            week_start: default_week_start(),
        }
    }
}

impl Config {
    pub fn load(override_path: Option<&Path>) -> Result<Config> {
        let mut cfg = match resolve_config_path(override_path) {
            Some(path) if path.exists() => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config at {}", path.display()))?;
                let parsed: Config = toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config at {}", path.display()))?;
                tracing::info!(path = %path.display(), "loaded config");
                parsed
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "config file not found; using defaults");
                Config::default()
            }
            None => {
                tracing::debug!("config disabled; using defaults");
                Config::default()
            }
        };
        if let Ok(zone) = std::env::var(TIMEZONE_ENV) {
            if !zone.trim().is_empty() {
                cfg.timezone = Some(zone);
            }
        }
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn apply_overrides(
        &mut self,
        timezone: Option<&str>,
        backend: Option<&str>,
        api_base: Option<&str>,
    ) {
        if let Some(zone) = timezone {
            tracing::debug!(timezone = zone, "override from command line");
            self.timezone = Some(zone.to_string());
        }
        if let Some(backend) = backend {
            tracing::debug!(backend, "override from command line");
            self.data.backend = backend.to_string();
        }
        if let Some(base) = api_base {
            tracing::debug!(base, "override from command line");
            self.api.base = base.to_string();
        }
    }

    fn sanitize(&mut self) {
        let week_start = self.calendar.week_start.trim();
        if !(week_start.eq_ignore_ascii_case("monday") || week_start.eq_ignore_ascii_case("sunday"))
        {
            tracing::warn!(
                week_start = %self.calendar.week_start,
                "unrecognized week_start; using monday"
            );
            self.calendar.week_start = default_week_start();
        }
        if self.data.location.trim().is_empty() {
            tracing::warn!("empty data.location; using default");
            self.data.location = default_data_location();
        }
        if self.api.base.trim().is_empty() {
            tracing::warn!("empty api.base; using default");
            self.api.base = default_api_base();
        }
        if let Some(token) = &self.api.token {
            if token.trim().is_empty() {
                self.api.token = None;
            }
        }
        if self.default_command.trim().is_empty() {
            self.default_command = default_command();
        }
    }

    #[must_use]
    pub fn week_start_day(&self) -> Weekday {
        if self.calendar.week_start.eq_ignore_ascii_case("sunday") {
            Weekday::Sun
        } else {
            Weekday::Mon
        }
    }

    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match override_dir {
            Some(dir) => dir.to_path_buf(),
            None => expand_tilde(&self.data.location)?,
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;
        Ok(dir)
    }
}

fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }
    if let Ok(raw) = std::env::var(CONFIG_ENV) {
        let trimmed = raw.trim();
        if trimmed == "/dev/null" || trimmed.is_empty() {
            return None;
        }
        return Some(PathBuf::from(trimmed));
    }
    dirs::config_dir().map(|dir| dir.join("postdeck").join("config.toml"))
}

fn expand_tilde(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return dirs::home_dir().ok_or_else(|| anyhow!("could not resolve home directory"));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("could not resolve home directory"))?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}
