//! Database operations for `scrape_runs`.

use chrono::{DateTime, Utc};
use dinedeal_core::{RunStatus, RunSummary};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scrape_runs` table. `counts` and `providers` hold the
/// serialized status counters.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeRunRow {
    pub run_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub counts: serde_json::Value,
    pub providers: serde_json::Value,
}

impl ScrapeRunRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] for an unknown status and
    /// [`DbError::Json`] when the counter columns do not decode.
    pub fn into_summary(self) -> Result<RunSummary, DbError> {
        let status = match self.status.as_str() {
            "running" => RunStatus::Running,
            "done" => RunStatus::Done,
            other => {
                return Err(DbError::InvalidValue {
                    column: "scrape_runs.status",
                    value: other.to_owned(),
                })
            }
        };
        Ok(RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: self.finished_at,
            status,
            counts: serde_json::from_value(self.counts)?,
            providers: serde_json::from_value(self.providers)?,
        })
    }
}

/// Inserts the run record written when a run starts.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the counters cannot be serialized, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_run(pool: &PgPool, summary: &RunSummary) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO scrape_runs (run_id, status, started_at, finished_at, counts, providers) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(summary.run_id)
    .bind(summary.status.as_str())
    .bind(summary.started_at)
    .bind(summary.finished_at)
    .bind(serde_json::to_value(summary.counts)?)
    .bind(serde_json::to_value(&summary.providers)?)
    .execute(pool)
    .await?;
    Ok(())
}

/// Overwrites status, finish time and counters of an existing run.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no run with `summary.run_id` exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn finish_scrape_run(pool: &PgPool, summary: &RunSummary) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scrape_runs \
         SET status = $1, finished_at = $2, counts = $3, providers = $4 \
         WHERE run_id = $5",
    )
    .bind(summary.status.as_str())
    .bind(summary.finished_at)
    .bind(serde_json::to_value(summary.counts)?)
    .bind(serde_json::to_value(&summary.providers)?)
    .bind(summary.run_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetches a run by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_run(pool: &PgPool, run_id: Uuid) -> Result<Option<ScrapeRunRow>, DbError> {
    let row = sqlx::query_as::<_, ScrapeRunRow>(
        "SELECT run_id, status, started_at, finished_at, counts, providers \
         FROM scrape_runs WHERE run_id = $1",
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
