//! [`OfferStore`] backed by Postgres.

use std::collections::BTreeMap;

use chrono::Utc;
use dinedeal_core::{
    HostBlock, OfferStore, Place, ProviderKey, ProviderRecord, ProviderRecordUpdate, RunSummary,
    StoreError,
};
use sqlx::PgPool;

use crate::{host_backoffs, places, provider_records, scrape_runs, DbError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => StoreError::NotFound("row".to_owned()),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

impl OfferStore for PgStore {
    async fn list_places(&self) -> Result<Vec<Place>, StoreError> {
        let rows = places::list_places(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.into_place() {
                Ok(place) => out.push(place),
                Err(e) => tracing::warn!(place_id = %id, error = %e, "skipping undecodable place"),
            }
        }
        Ok(out)
    }

    async fn provider_records(
        &self,
        place_id: &str,
    ) -> Result<BTreeMap<String, ProviderRecord>, StoreError> {
        let rows = provider_records::list_provider_records(&self.pool, place_id).await?;
        let mut out = BTreeMap::new();
        for row in rows {
            let provider = row.provider_key.clone();
            match row.into_record() {
                Ok(record) => {
                    out.insert(provider, record);
                }
                Err(e) => tracing::warn!(
                    place_id,
                    provider = %provider,
                    error = %e,
                    "ignoring undecodable provider record"
                ),
            }
        }
        Ok(out)
    }

    async fn upsert_provider_record(
        &self,
        place_id: &str,
        provider: ProviderKey,
        update: &ProviderRecordUpdate,
    ) -> Result<(), StoreError> {
        provider_records::upsert_provider_record(&self.pool, place_id, provider, update).await?;
        Ok(())
    }

    async fn create_run(&self, summary: &RunSummary) -> Result<(), StoreError> {
        scrape_runs::create_scrape_run(&self.pool, summary).await?;
        Ok(())
    }

    async fn finish_run(&self, summary: &RunSummary) -> Result<(), StoreError> {
        scrape_runs::finish_scrape_run(&self.pool, summary)
            .await
            .map_err(|e| match e {
                DbError::NotFound => StoreError::NotFound(format!("run {}", summary.run_id)),
                other => other.into(),
            })
    }

    async fn load_host_blocks(&self) -> Result<Vec<HostBlock>, StoreError> {
        let rows = host_backoffs::list_active_host_backoffs(&self.pool, Utc::now()).await?;
        Ok(rows
            .into_iter()
            .map(|row| HostBlock {
                host: row.host,
                blocked_until: row.blocked_until,
            })
            .collect())
    }

    async fn save_host_block(&self, block: &HostBlock) -> Result<(), StoreError> {
        host_backoffs::upsert_host_backoff(&self.pool, &block.host, block.blocked_until).await?;
        Ok(())
    }
}
