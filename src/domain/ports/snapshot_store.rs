use async_trait::async_trait;

use crate::domain::errors::StoreResult;

/// Local key-value slot the store is persisted to between sessions
///
/// Persistence is best-effort: callers treat any error here as "no snapshot".
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored payload, `None` if nothing was ever saved
    async fn load(&self) -> StoreResult<Option<String>>;

    /// Overwrite the stored payload
    async fn save(&self, payload: &str) -> StoreResult<()>;

    /// Remove the stored payload
    async fn clear(&self) -> StoreResult<()>;
}
