use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{HostBlock, OfferStore, StoreError};
use crate::{Place, ProviderKey, ProviderRecord, ProviderRecordUpdate, RunSummary};

#[derive(Debug, Default)]
struct State {
    places: Vec<Place>,
    records: BTreeMap<(String, String), ProviderRecord>,
    runs: BTreeMap<Uuid, RunSummary>,
    host_blocks: BTreeMap<String, HostBlock>,
    record_writes: usize,
}

/// An [`OfferStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn with_places(places: Vec<Place>) -> Self {
        let store = Self::default();
        store.lock().places = places;
        store
    }

    pub fn insert_record(&self, place_id: &str, provider: ProviderKey, record: ProviderRecord) {
        self.lock()
            .records
            .insert((place_id.to_owned(), provider.as_str().to_owned()), record);
    }

    #[must_use]
    pub fn record(&self, place_id: &str, provider: ProviderKey) -> Option<ProviderRecord> {
        self.lock()
            .records
            .get(&(place_id.to_owned(), provider.as_str().to_owned()))
            .cloned()
    }

    #[must_use]
    pub fn run(&self, run_id: Uuid) -> Option<RunSummary> {
        self.lock().runs.get(&run_id).cloned()
    }

    #[must_use]
    pub fn host_blocks(&self) -> Vec<HostBlock> {
        self.lock().host_blocks.values().cloned().collect()
    }

    /// Number of provider-record upserts received so far.
    #[must_use]
    pub fn record_writes(&self) -> usize {
        self.lock().record_writes
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl OfferStore for MemoryStore {
    async fn list_places(&self) -> Result<Vec<Place>, StoreError> {
        Ok(self.lock().places.clone())
    }

    async fn provider_records(
        &self,
        place_id: &str,
    ) -> Result<BTreeMap<String, ProviderRecord>, StoreError> {
        Ok(self
            .lock()
            .records
            .iter()
            .filter(|((place, _), _)| place == place_id)
            .map(|((_, provider), record)| (provider.clone(), record.clone()))
            .collect())
    }

    async fn upsert_provider_record(
        &self,
        place_id: &str,
        provider: ProviderKey,
        update: &ProviderRecordUpdate,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        let key = (place_id.to_owned(), provider.as_str().to_owned());
        let prior = state.records.remove(&key);
        state.records.insert(key, update.apply_to(prior));
        state.record_writes += 1;
        Ok(())
    }

    async fn create_run(&self, summary: &RunSummary) -> Result<(), StoreError> {
        self.lock().runs.insert(summary.run_id, summary.clone());
        Ok(())
    }

    async fn finish_run(&self, summary: &RunSummary) -> Result<(), StoreError> {
        let mut state = self.lock();
        if !state.runs.contains_key(&summary.run_id) {
            return Err(StoreError::NotFound(format!("run {}", summary.run_id)));
        }
        state.runs.insert(summary.run_id, summary.clone());
        Ok(())
    }

    async fn load_host_blocks(&self) -> Result<Vec<HostBlock>, StoreError> {
        let now = Utc::now();
        Ok(self
            .lock()
            .host_blocks
            .values()
            .filter(|block| block.blocked_until > now)
            .cloned()
            .collect())
    }

    async fn save_host_block(&self, block: &HostBlock) -> Result<(), StoreError> {
        self.lock()
            .host_blocks
            .insert(block.host.clone(), block.clone());
        Ok(())
    }
}
