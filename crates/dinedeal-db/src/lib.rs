//! Postgres persistence for places, provider records, scrape runs and host
//! backoff, plus the [`PgStore`] adapter the scrape run talks to.

pub mod host_backoffs;
pub mod places;
pub mod provider_records;
pub mod scrape_runs;
pub mod store;

use std::time::Duration;

use dinedeal_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub use host_backoffs::{list_active_host_backoffs, upsert_host_backoff, HostBackoffRow};
pub use places::{list_places, upsert_place, PlaceRow};
pub use provider_records::{list_provider_records, upsert_provider_record, ProviderRecordRow};
pub use scrape_runs::{create_scrape_run, finish_scrape_run, get_scrape_run, ScrapeRunRow};
pub use store::PgStore;

// Resolved relative to this crate's Cargo.toml.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Pool sizing. Defaults match the `DINEDEAL_DB_*` env defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("JSON column could not be (de)serialized: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value {value:?} in column {column}")]
    InvalidValue { column: &'static str, value: String },
}

/// Opens a pool against `database_url`.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] for a blank URL, or
/// [`DbError::Sqlx`] if no connection can be made.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DbError> {
    let database_url = database_url.trim();
    if database_url.is_empty() {
        return Err(DbError::MissingDatabaseUrl);
    }
    tracing::debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "connecting to postgres"
    );
    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await?)
}

/// Applies pending migrations and returns how many were applied.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied = applied_migrations(pool).await.saturating_sub(before);
    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

/// Successful entries in sqlx's bookkeeping table. Zero before the first
/// migration, when the table does not exist yet.
async fn applied_migrations(pool: &PgPool) -> usize {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .ok()
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(0)
}

/// Round-trips `SELECT 1`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_defaults_match_env_defaults() {
        assert_eq!(
            PoolConfig::default(),
            PoolConfig {
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 10,
            }
        );
    }

    #[tokio::test]
    async fn blank_database_url_is_rejected_before_connecting() {
        let err = connect_pool("  ", PoolConfig::default()).await.unwrap_err();
        assert!(matches!(err, DbError::MissingDatabaseUrl));
    }
}
