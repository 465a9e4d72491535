use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::utils::time::CalendarZone;

pub const DEFAULT_CONFIG_FILE: &str = "tubestats.toml";
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const ENV_PREFIX: &str = "TUBESTATS";
const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// YouTube Data API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// Usually supplied through `YOUTUBE_API_KEY` rather than the file
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_videos_per_channel")]
    pub max_videos_per_channel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Newline separated channel identifiers
    pub channels_file: PathBuf,
    /// Six-field cron expression (seconds first)
    pub update_cron: String,
    #[serde(default)]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// IANA zone name or `+HH:MM` offset deciding which calendar day a
    /// snapshot belongs to; local time when unset
    pub timezone: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_YOUTUBE_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_videos_per_channel() -> usize {
    500
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./tubestats.db".to_string(),
            max_connections: Some(5),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_videos_per_channel: default_max_videos_per_channel(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            channels_file: PathBuf::from("channels.txt"),
            update_cron: "0 0 6 * * *".to_string(),
            run_on_startup: false,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or `CONFIG_FILE`, or `tubestats.toml`).
    ///
    /// A missing file is created with defaults. Values from the file are then
    /// overridden by `TUBESTATS__SECTION__KEY` variables and the API key by
    /// `YOUTUBE_API_KEY`; a `.env` file is read first if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let config_file = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var("CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };

        if !config_file.exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(&config_file, contents)?;
            info!("Wrote default configuration to {}", config_file.display());
        }

        let mut config: Self = config::Config::builder()
            .add_source(config::File::new(
                &config_file.to_string_lossy(),
                config::FileFormat::Toml,
            ))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.youtube.api_key = Some(key.trim().to_string());
            }
        }

        Ok(config)
    }

    /// API key for commands that talk to YouTube
    pub fn require_api_key(&self) -> AppResult<&str> {
        self.youtube
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "no YouTube API key configured; set {} or youtube.api_key",
                    API_KEY_ENV
                ))
            })
    }

    pub fn calendar_zone(&self) -> AppResult<CalendarZone> {
        CalendarZone::from_config(self.history.timezone.as_deref()).map_err(AppError::configuration)
    }
}
