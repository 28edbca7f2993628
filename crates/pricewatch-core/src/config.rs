use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Reads `.env` (if present) and then the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unusable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Reads the process environment only; `.env` is ignored.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an unusable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|var| std::env::var(var))
}

/// Blank values count as unset. `lookup` is injectable so tests can pass a
/// `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_base_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if !(raw.starts_with("http://") || raw.starts_with("https://")) {
            return Err(invalid(var, format!("\"{raw}\" is not an http(s) URL")));
        }
        Ok(raw.trim_end_matches('/').to_string())
    };

    let env = parse_environment(&or_default("PRICEWATCH_ENV", "development"));
    let log_level = or_default("PRICEWATCH_LOG_LEVEL", "info");
    let bind_addr = parse_addr("PRICEWATCH_BIND_ADDR", "0.0.0.0:8080")?;

    let telegram_bot_token = optional("TELEGRAM_BOT_TOKEN");
    let telegram_api_url =
        parse_base_url("PRICEWATCH_TELEGRAM_API_URL", "https://api.telegram.org")?;
    let webhook_url = optional("PRICEWATCH_WEBHOOK_URL");
    if let Some(url) = &webhook_url {
        if !url.starts_with("https://") {
            return Err(invalid(
                "PRICEWATCH_WEBHOOK_URL",
                "webhook URL must use https".to_string(),
            ));
        }
    }
    let webhook_secret = optional("PRICEWATCH_WEBHOOK_SECRET");

    let check_interval_secs = parse_u64("PRICEWATCH_CHECK_INTERVAL_SECS", "600")?;
    if check_interval_secs == 0 {
        return Err(invalid(
            "PRICEWATCH_CHECK_INTERVAL_SECS",
            "interval must be greater than zero".to_string(),
        ));
    }
    let max_entries = parse_usize("PRICEWATCH_MAX_ENTRIES", "20")?;
    if max_entries == 0 {
        return Err(invalid(
            "PRICEWATCH_MAX_ENTRIES",
            "at least one entry must be scanned".to_string(),
        ));
    }
    let max_concurrent_users = parse_usize("PRICEWATCH_MAX_CONCURRENT_USERS", "4")?;

    let categories_path = PathBuf::from(or_default(
        "PRICEWATCH_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let data_dir = PathBuf::from(or_default("PRICEWATCH_DATA_DIR", "./user_data"));
    let database_url = optional("DATABASE_URL");
    let db_max_connections = parse_u32("PRICEWATCH_DB_MAX_CONNECTIONS", "5")?;

    let scraper_request_timeout_secs = parse_u64("PRICEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "15")?;
    let scraper_user_agent = or_default("PRICEWATCH_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_max_retries = parse_u32("PRICEWATCH_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_ms =
        parse_u64("PRICEWATCH_SCRAPER_RETRY_BACKOFF_BASE_MS", "500")?;

    let marketplace_site_url =
        parse_base_url("PRICEWATCH_MARKETPLACE_SITE_URL", "https://www.wildberries.ru")?;
    let marketplace_catalog_url =
        parse_base_url("PRICEWATCH_MARKETPLACE_CATALOG_URL", "https://catalog.wb.ru")?;
    let marketplace_search_url =
        parse_base_url("PRICEWATCH_MARKETPLACE_SEARCH_URL", "https://search.wb.ru")?;

    Ok(AppConfig {
        env,
        log_level,
        bind_addr,
        telegram_bot_token,
        telegram_api_url,
        webhook_url,
        webhook_secret,
        check_interval_secs,
        max_entries,
        max_concurrent_users,
        categories_path,
        data_dir,
        database_url,
        db_max_connections,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        marketplace_site_url,
        marketplace_catalog_url,
        marketplace_search_url,
    })
}

/// Anything other than `production` or `test` is development.
fn parse_environment(raw: &str) -> Environment {
    match raw.to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
