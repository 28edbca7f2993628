use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub bind_addr: SocketAddr,
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub check_interval_secs: u64,
    pub max_entries: usize,
    pub max_concurrent_users: usize,
    pub categories_path: PathBuf,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
    pub marketplace_site_url: String,
    pub marketplace_catalog_url: String,
    pub marketplace_search_url: String,
}

impl AppConfig {
    /// Returns the bot token, which only the long-running bot requires.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `TELEGRAM_BOT_TOKEN` was not set.
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram_bot_token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("bind_addr", &self.bind_addr)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("telegram_api_url", &self.telegram_api_url)
            .field("webhook_url", &self.webhook_url)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("check_interval_secs", &self.check_interval_secs)
            .field("max_entries", &self.max_entries)
            .field("max_concurrent_users", &self.max_concurrent_users)
            .field("categories_path", &self.categories_path)
            .field("data_dir", &self.data_dir)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field("marketplace_site_url", &self.marketplace_site_url)
            .field("marketplace_catalog_url", &self.marketplace_catalog_url)
            .field("marketplace_search_url", &self.marketplace_search_url)
            .finish()
    }
}
