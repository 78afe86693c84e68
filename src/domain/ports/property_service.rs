use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::errors::StoreResult;
use crate::domain::models::{FilterCriteria, PageInfo, PropertyDraft};

/// One page of raw records as returned by the backing service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResponse {
    /// Raw records in any shape the normalizer accepts
    pub records: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<PageInfo>,
}

/// Backing service that owns the authoritative property data
///
/// Implementations handle transport, retries and timeouts. Failures should
/// be reported as `StoreError::UpstreamFailure` carrying the transport's own
/// message; the cache surfaces it unchanged.
#[async_trait]
pub trait PropertyService: Send + Sync {
    /// List raw records matching the criteria
    async fn list(&self, criteria: &FilterCriteria, page: u64, limit: u64)
        -> StoreResult<ListResponse>;

    /// Fetch one raw record by identifier
    async fn fetch(&self, id: &str) -> StoreResult<Value>;

    /// Create a property; the response carries the assigned identifier
    async fn create(&self, draft: &PropertyDraft) -> StoreResult<Value>;

    /// Replace the attributes of an existing property
    async fn update(&self, id: &str, draft: &PropertyDraft) -> StoreResult<Value>;

    /// Delete a property
    async fn delete(&self, id: &str) -> StoreResult<()>;
}
