//! Database operations for `host_backoffs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HostBackoffRow {
    pub host: String,
    pub blocked_until: DateTime<Utc>,
}

/// Hosts whose backoff ends after `now`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_host_backoffs(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<HostBackoffRow>, DbError> {
    let rows = sqlx::query_as::<_, HostBackoffRow>(
        "SELECT host, blocked_until FROM host_backoffs \
         WHERE blocked_until > $1 ORDER BY host",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Records a backoff for `host`. An existing later `blocked_until` wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_host_backoff(
    pool: &PgPool,
    host: &str,
    blocked_until: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO host_backoffs (host, blocked_until) VALUES ($1, $2) \
         ON CONFLICT (host) DO UPDATE SET \
             blocked_until = GREATEST(host_backoffs.blocked_until, EXCLUDED.blocked_until), \
             updated_at = NOW()",
    )
    .bind(host)
    .bind(blocked_until)
    .execute(pool)
    .await?;
    Ok(())
}
