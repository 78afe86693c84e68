//! Store facade.
//!
//! The one surface callers use. Reads are synchronous and never change the
//! store; writes go through the mutation pipeline or the ingestion path.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

use super::fetch_coordinator::{FetchCoordinator, FetchOutcome};
use super::mutation_pipeline::{Mutation, MutationHandle, MutationId, MutationOutcome, MutationPhase, MutationPipeline};
use super::pagination;
use super::property_store::{
    read_store, write_store, IngestReport, InsertMode, PropertyStore, SharedStore, StoreSnapshot,
};
use crate::domain::errors::StoreResult;
use crate::domain::models::{FilterCriteria, Page, Property, PropertyStats};
use crate::domain::ports::{PropertyService, SnapshotStore};

/// Read/write entry point over one property store.
#[derive(Debug, Clone)]
pub struct StoreFacade {
    store: SharedStore,
    pipeline: MutationPipeline,
    fetcher: FetchCoordinator,
}

impl StoreFacade {
    /// A facade over a fresh, empty store.
    pub fn new(service: Arc<dyn PropertyService>) -> Self {
        Self::with_store(PropertyStore::new().into_shared(), service)
    }

    pub fn with_store(store: SharedStore, service: Arc<dyn PropertyService>) -> Self {
        Self {
            pipeline: MutationPipeline::new(Arc::clone(&store), Arc::clone(&service)),
            fetcher: FetchCoordinator::new(Arc::clone(&store), service),
            store,
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Properties matching `criteria`, in listing order.
    ///
    /// When `criteria` are the current ones the cached filtered view is used;
    /// otherwise the view is derived on the fly and not stored.
    pub fn select(&self, criteria: &FilterCriteria) -> Vec<Property> {
        let store = read_store(&self.store);
        if store.criteria() == criteria {
            return store.filtered().into_iter().cloned().collect();
        }

        store
            .view_for(criteria)
            .iter()
            .filter_map(|id| store.get(id).cloned())
            .collect()
    }

    /// The current filtered view.
    pub fn select_current(&self) -> Vec<Property> {
        read_store(&self.store)
            .filtered()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn select_by_id(&self, id: &str) -> Option<Property> {
        read_store(&self.store).lookup(id).cloned()
    }

    pub fn select_selected(&self) -> Option<Property> {
        read_store(&self.store).selected().cloned()
    }

    /// Aggregates over the whole listing, not the filtered view.
    pub fn select_stats(&self) -> PropertyStats {
        read_store(&self.store).stats()
    }

    /// One page of the current filtered view.
    pub fn select_page(&self, page: u64, limit: u64) -> Page<Property> {
        let store = read_store(&self.store);
        let filtered = store.filtered_ids();
        let items = pagination::page_of(filtered, page, limit)
            .iter()
            .filter_map(|id| store.get(id).cloned())
            .collect();

        Page {
            items,
            info: pagination::paginate(filtered.len() as u64, page, limit),
        }
    }

    pub fn current_criteria(&self) -> FilterCriteria {
        read_store(&self.store).criteria().clone()
    }

    pub fn is_cache_valid(&self) -> bool {
        read_store(&self.store).cache().is_valid()
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Start a mutation; the handle settles once the service answers.
    pub fn dispatch(&self, mutation: Mutation) -> MutationHandle {
        self.pipeline.dispatch(mutation)
    }

    /// Run a mutation to settlement.
    pub async fn execute(&self, mutation: Mutation) -> StoreResult<MutationOutcome> {
        self.pipeline.execute(mutation).await
    }

    pub fn phase(&self, id: MutationId) -> MutationPhase {
        self.pipeline.phase(id)
    }

    pub fn acknowledge(&self, id: MutationId) -> MutationPhase {
        self.pipeline.acknowledge(id)
    }

    // ---------------------------------------------------------------------
    // Filters and ingestion
    // ---------------------------------------------------------------------

    /// Make `criteria` current and re-derive the filtered view.
    pub fn set_filters(&self, criteria: FilterCriteria) {
        tracing::debug!(?criteria, "filters changed");
        write_store(&self.store).set_criteria(criteria);
    }

    /// Change the current criteria through a closure.
    pub fn update_filters(&self, update: impl FnOnce(&mut FilterCriteria)) {
        let mut store = write_store(&self.store);
        let mut criteria = store.criteria().clone();
        update(&mut criteria);
        store.set_criteria(criteria);
    }

    pub fn reset_filters(&self) {
        write_store(&self.store).reset_criteria();
    }

    /// Normalize and store raw records handed over by fetch orchestration.
    pub fn ingest(&self, raw: &[Value], mode: InsertMode) -> IngestReport {
        write_store(&self.store).ingest(raw, mode, Utc::now())
    }

    /// Refresh the listing unless the cache is valid for `criteria`.
    pub async fn fetch_list(
        &self,
        criteria: FilterCriteria,
        page: u64,
        limit: u64,
        force: bool,
    ) -> StoreResult<FetchOutcome> {
        self.fetcher.fetch_list(criteria, page, limit, force).await
    }

    /// Empty the store and mark the cache stale.
    pub fn clear(&self) {
        write_store(&self.store).clear();
    }

    // ---------------------------------------------------------------------
    // Session persistence
    // ---------------------------------------------------------------------

    /// Serialize the store into the snapshot slot.
    pub async fn save_snapshot(&self, snapshots: &dyn SnapshotStore) -> StoreResult<()> {
        let payload = {
            let store = read_store(&self.store);
            serde_json::to_string(&store.snapshot())?
        };
        snapshots.save(&payload).await?;
        tracing::debug!(bytes = payload.len(), "store snapshot saved");
        Ok(())
    }

    /// Load the store from the snapshot slot.
    ///
    /// A missing, unreadable or corrupt snapshot leaves an empty store; it is
    /// never an error. The cache always starts stale.
    pub async fn restore_snapshot(&self, snapshots: &dyn SnapshotStore) -> IngestReport {
        let snapshot = match snapshots.load().await {
            Ok(Some(payload)) => match serde_json::from_str::<StoreSnapshot>(&payload) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracing::warn!(error = %err, "corrupt store snapshot, starting empty");
                    StoreSnapshot::default()
                }
            },
            Ok(None) => {
                tracing::debug!("no store snapshot found");
                StoreSnapshot::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "store snapshot unreadable, starting empty");
                StoreSnapshot::default()
            }
        };

        let (mut restored, report) = PropertyStore::from_snapshot(snapshot);
        tracing::info!(
            restored = report.accepted.len(),
            rejected = report.rejected.len(),
            "store restored from snapshot"
        );
        let mut store = write_store(&self.store);
        restored.cache_mut().supersede(store.cache());
        *store = restored;
        report
    }
}
