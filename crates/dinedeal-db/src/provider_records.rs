//! Database operations for `provider_records`.

use chrono::{DateTime, Utc};
use dinedeal_core::{ProviderKey, ProviderRecord, ProviderRecordUpdate, ScrapeStatus};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `provider_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRecordRow {
    pub place_id: String,
    pub provider_key: String,
    pub source_url: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub status: String,
    pub stale: bool,
    pub parser_version: String,
    pub hash: Option<String>,
    pub offers: serde_json::Value,
    pub raw_offer_texts: serde_json::Value,
    pub error_message: Option<String>,
}

impl ProviderRecordRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] for an unknown status and
    /// [`DbError::Json`] when the offer columns do not decode.
    pub fn into_record(self) -> Result<ProviderRecord, DbError> {
        let status: ScrapeStatus = self.status.parse().map_err(|_| DbError::InvalidValue {
            column: "provider_records.status",
            value: self.status.clone(),
        })?;
        Ok(ProviderRecord {
            source_url: self.source_url,
            fetched_at: self.fetched_at,
            status,
            stale: self.stale,
            parser_version: self.parser_version,
            hash: self.hash,
            offers: serde_json::from_value(self.offers)?,
            raw_offer_texts: serde_json::from_value(self.raw_offer_texts)?,
            error_message: self.error_message,
        })
    }
}

/// Returns all provider records stored for `place_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_provider_records(
    pool: &PgPool,
    place_id: &str,
) -> Result<Vec<ProviderRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, ProviderRecordRow>(
        "SELECT place_id, provider_key, source_url, fetched_at, status, stale, \
                parser_version, hash, offers, raw_offer_texts, error_message \
         FROM provider_records \
         WHERE place_id = $1 \
         ORDER BY provider_key",
    )
    .bind(place_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Merges `update` into the row for `(place_id, provider)`.
///
/// Status, freshness and `error_message` are always overwritten. `hash`,
/// `offers` and `raw_offer_texts` keep their stored values when the update
/// leaves them unset.
///
/// # Errors
///
/// Returns [`DbError::Json`] if the offers cannot be serialized, or
/// [`DbError::Sqlx`] if the upsert fails (including a missing place).
pub async fn upsert_provider_record(
    pool: &PgPool,
    place_id: &str,
    provider: ProviderKey,
    update: &ProviderRecordUpdate,
) -> Result<(), DbError> {
    let offers = update
        .offers
        .as_ref()
        .map(serde_json::to_value)
        .transpose()?;
    let raw_offer_texts = update
        .raw_offer_texts
        .as_ref()
        .map(serde_json::to_value)
        .transpose()?;

    sqlx::query(
        "INSERT INTO provider_records \
             (place_id, provider_key, source_url, fetched_at, status, stale, parser_version, \
              hash, error_message, offers, raw_offer_texts) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, \
                 COALESCE($10, '[]'::jsonb), COALESCE($11, '[]'::jsonb)) \
         ON CONFLICT (place_id, provider_key) DO UPDATE SET \
             source_url = EXCLUDED.source_url, \
             fetched_at = EXCLUDED.fetched_at, \
             status = EXCLUDED.status, \
             stale = EXCLUDED.stale, \
             parser_version = EXCLUDED.parser_version, \
             hash = COALESCE($8, provider_records.hash), \
             error_message = EXCLUDED.error_message, \
             offers = COALESCE($10, provider_records.offers), \
             raw_offer_texts = COALESCE($11, provider_records.raw_offer_texts), \
             updated_at = NOW()",
    )
    .bind(place_id)
    .bind(provider.as_str())
    .bind(&update.source_url)
    .bind(update.fetched_at)
    .bind(update.status.as_str())
    .bind(update.stale)
    .bind(&update.parser_version)
    .bind(update.hash.as_deref())
    .bind(update.error_message.as_deref())
    .bind(offers)
    .bind(raw_offer_texts)
    .execute(pool)
    .await?;

    Ok(())
}
