use std::path::Path;

use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// When `credentials_path` is given, that dotenv-style file is loaded first
/// and its values take precedence over a local `.env`. Variables already set
/// in the process environment are never overridden.
///
/// # Errors
///
/// Returns `ConfigError` if the credentials file cannot be read, required env
/// vars are missing, or values are invalid.
pub fn load_app_config(credentials_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = credentials_path {
        dotenvy::from_path(path).map_err(|e| ConfigError::CredentialsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    }
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_number(var, &or_default(var, default))
    };
    let parse_count = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_number(var, &or_default(var, default))
    };
    let parse_connections = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_number(var, &or_default(var, default))
    };

    let database_url = require("DATABASE_URL")?;
    let log_level = or_default("DINEDEAL_LOG_LEVEL", "info");

    let db_max_connections = parse_connections("DINEDEAL_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_connections("DINEDEAL_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse("DINEDEAL_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let request_timeout_secs = parse("DINEDEAL_REQUEST_TIMEOUT_SECS", "20")?;
    let user_agent = or_default("DINEDEAL_USER_AGENT", DEFAULT_USER_AGENT);
    let max_concurrent_tasks = parse_count("DINEDEAL_MAX_CONCURRENT_TASKS", "4")?;
    let jitter_min_secs = parse("DINEDEAL_JITTER_MIN_SECS", "5")?;
    let jitter_max_secs = parse("DINEDEAL_JITTER_MAX_SECS", "20")?;
    let block_backoff_hours = parse("DINEDEAL_BLOCK_BACKOFF_HOURS", "6")?;
    let offer_text_limit = parse_count("DINEDEAL_OFFER_TEXT_LIMIT", "25")?;

    if jitter_min_secs > jitter_max_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "DINEDEAL_JITTER_MIN_SECS".to_string(),
            reason: format!(
                "minimum jitter ({jitter_min_secs}s) exceeds maximum ({jitter_max_secs}s)"
            ),
        });
    }

    if max_concurrent_tasks == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DINEDEAL_MAX_CONCURRENT_TASKS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        request_timeout_secs,
        user_agent,
        max_concurrent_tasks,
        jitter_min_secs,
        jitter_max_secs,
        block_backoff_hours,
        offer_text_limit,
    })
}

fn parse_number<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: format!("{raw:?}: {e}"),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
