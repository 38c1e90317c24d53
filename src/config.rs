//! Configuration types for tardis-dl
//!
//! The process-wide [`Config`] is constructed once at startup (either directly
//! or via [`Config::from_env`]) and passed by reference to the service and the
//! API server. There is no runtime mutation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Main configuration for the download service
///
/// Fields are organized into logical sub-configs:
/// - [`api`](ApiConfig) — bind address, authentication, CORS, docs
/// - [`download`](DownloadSettings) — upstream provider and output layout
/// - [`telegram`](TelegramConfig) — lifecycle notification delivery
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Path to the SQLite job database (default: "./tardis-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// API server settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Download execution settings
    #[serde(default)]
    pub download: DownloadSettings,

    /// Telegram notification settings
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            api: ApiConfig::default(),
            download: DownloadSettings::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

/// API server configuration (authentication, CORS, documentation)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind the API server to (default: "0.0.0.0:8000")
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Shared-secret token required in the X-Api-Token header (None = no token check)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Usernames allowed to submit and read jobs (empty = allow all)
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Whether to add CORS headers to responses
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" or empty = any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Whether to serve the Swagger UI at /swagger-ui
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_token: None,
            allowed_users: Vec::new(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            swagger_ui: true,
        }
    }
}

impl ApiConfig {
    /// Check whether a username may use the service.
    ///
    /// An empty allow-list means everyone is allowed.
    pub fn is_user_allowed(&self, username: &str) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.iter().any(|u| u == username)
    }
}

/// Download execution configuration (upstream provider, output, concurrency)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadSettings {
    /// Tardis API key used for all downloads (callers never see it)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the Tardis datasets endpoint
    #[serde(default = "default_datasets_url")]
    pub datasets_url: String,

    /// Directory downloads land in when the request doesn't supply one
    #[serde(default = "default_output_path")]
    pub default_output_path: PathBuf,

    /// Maximum number of jobs downloading at the same time (default: 4)
    ///
    /// Submissions beyond the limit stay pending until a slot frees up.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            datasets_url: default_datasets_url(),
            default_output_path: default_output_path(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

/// Telegram notification configuration
///
/// Notifications are disabled entirely when `bot_token` is unset.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather (None = notifications disabled)
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat, group, or channel ID to deliver messages to
    #[serde(default)]
    pub chat_id: String,

    /// Base URL of the Telegram Bot API (overridable for testing)
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    /// Per-message delivery timeout in seconds (default: 10)
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: String::new(),
            api_url: default_telegram_api_url(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

impl Config {
    /// Build a configuration from environment variables.
    ///
    /// Recognized variables:
    /// - `DATABASE_PATH`, `API_BIND_ADDRESS`, `API_TOKEN`, `ALLOWED_USERS`
    ///   (comma-separated)
    /// - `TARDIS_API_KEY`, `DEFAULT_OUTPUT_PATH`, `MAX_CONCURRENT_JOBS`
    /// - `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("API_BIND_ADDRESS") {
            config.api.bind_address = addr.parse().map_err(|e| Error::Config {
                message: format!("invalid API_BIND_ADDRESS '{}': {}", addr, e),
                key: Some("API_BIND_ADDRESS".to_string()),
            })?;
        }
        if let Ok(token) = std::env::var("API_TOKEN")
            && !token.is_empty()
        {
            config.api.api_token = Some(token);
        }
        if let Ok(users) = std::env::var("ALLOWED_USERS") {
            config.api.allowed_users = users
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(key) = std::env::var("TARDIS_API_KEY")
            && !key.is_empty()
        {
            config.download.api_key = Some(key);
        }
        if let Ok(path) = std::env::var("DEFAULT_OUTPUT_PATH") {
            config.download.default_output_path = PathBuf::from(path);
        }
        if let Ok(max) = std::env::var("MAX_CONCURRENT_JOBS") {
            config.download.max_concurrent_jobs = max.parse().map_err(|e| Error::Config {
                message: format!("invalid MAX_CONCURRENT_JOBS '{}': {}", max, e),
                key: Some("MAX_CONCURRENT_JOBS".to_string()),
            })?;
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN")
            && !token.is_empty()
        {
            config.telegram.bot_token = Some(token);
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            config.telegram.chat_id = chat_id;
        }

        Ok(config)
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./tardis-dl.db")
}

fn default_bind_address() -> SocketAddr {
    "0.0.0.0:8000".parse().unwrap_or_else(|_| {
        // Hardcoded literal always parses; fall back to a loopback placeholder
        SocketAddr::from(([127, 0, 0, 1], 8000))
    })
}

fn default_datasets_url() -> String {
    "https://datasets.tardis.dev/v1".to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./datasets")
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_notify_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
