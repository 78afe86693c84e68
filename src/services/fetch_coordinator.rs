//! List fetch orchestration.
//!
//! Consults the cache controller before going to the backing service and
//! feeds whatever comes back through the ingestion path.

use chrono::Utc;
use std::sync::Arc;

use super::property_store::{read_store, write_store, IngestReport, InsertMode, SharedStore};
use crate::domain::errors::StoreResult;
use crate::domain::models::{FilterCriteria, PageInfo};
use crate::domain::ports::PropertyService;

/// Result of a list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The cache was valid for these criteria; no call was made
    Skipped,
    Fetched {
        report: IngestReport,
        pagination: Option<PageInfo>,
    },
    /// The store was invalidated while the call was in flight; the response
    /// was dropped and the cache stays stale
    Superseded,
}

#[derive(Clone)]
pub struct FetchCoordinator {
    store: SharedStore,
    service: Arc<dyn PropertyService>,
}

impl FetchCoordinator {
    pub fn new(store: SharedStore, service: Arc<dyn PropertyService>) -> Self {
        Self { store, service }
    }

    /// Refresh the listing for `criteria` unless the cache already covers it.
    ///
    /// On success the listing is replaced, the criteria become current and the
    /// cache is marked fresh. An upstream failure leaves the store untouched,
    /// and so does a response that arrives after a mutation committed.
    pub async fn fetch_list(
        &self,
        criteria: FilterCriteria,
        page: u64,
        limit: u64,
        force: bool,
    ) -> StoreResult<FetchOutcome> {
        let now = Utc::now();
        let epoch = {
            let store = read_store(&self.store);
            if !force && store.cache().is_valid_for(&criteria, now) {
                tracing::debug!(page, limit, "cache valid, skipping fetch");
                return Ok(FetchOutcome::Skipped);
            }
            store.cache().epoch()
        };

        let response = self.service.list(&criteria, page, limit).await?;

        let mut store = write_store(&self.store);
        if store.cache().epoch() != epoch {
            tracing::warn!(page, limit, "store changed during list fetch, dropping response");
            return Ok(FetchOutcome::Superseded);
        }
        let report = store.ingest(&response.records, InsertMode::Replace, now);
        store.set_criteria(criteria.clone());
        store.cache_mut().mark_refreshed_at(criteria, now);
        tracing::info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            page,
            limit,
            "property list refreshed"
        );

        Ok(FetchOutcome::Fetched {
            report,
            pagination: response.pagination,
        })
    }
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator").finish_non_exhaustive()
    }
}
