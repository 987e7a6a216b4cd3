//! The persistence boundary the scrape run depends on.
//!
//! The run only needs a handful of operations: enumerate places, read a
//! place's provider records, merge-write one provider record, write the run
//! summary, and persist host backoff. Postgres lives in `dinedeal-db`; an
//! in-memory implementation is available behind the `test-util` feature.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{Place, ProviderKey, ProviderRecord, ProviderRecordUpdate, RunSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("record not found: {0}")]
    NotFound(String),
}

/// A host in backoff and when the backoff ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBlock {
    pub host: String,
    pub blocked_until: DateTime<Utc>,
}

pub trait OfferStore: Sync {
    fn list_places(&self) -> impl Future<Output = Result<Vec<Place>, StoreError>> + Send;

    /// Provider records for a place keyed by provider key string. A place
    /// with no records yields an empty map.
    fn provider_records(
        &self,
        place_id: &str,
    ) -> impl Future<Output = Result<BTreeMap<String, ProviderRecord>, StoreError>> + Send;

    /// Merges `update` into the stored record for `(place_id, provider)`,
    /// creating it if absent. See [`ProviderRecordUpdate`] for field rules.
    fn upsert_provider_record(
        &self,
        place_id: &str,
        provider: ProviderKey,
        update: &ProviderRecordUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn create_run(&self, summary: &RunSummary)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    fn finish_run(&self, summary: &RunSummary)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Host blocks whose `blocked_until` is still in the future.
    fn load_host_blocks(&self) -> impl Future<Output = Result<Vec<HostBlock>, StoreError>> + Send;

    fn save_host_block(&self, block: &HostBlock)
        -> impl Future<Output = Result<(), StoreError>> + Send;
}
