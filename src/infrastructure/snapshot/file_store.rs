use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::errors::StoreResult;
use crate::domain::ports::SnapshotStore;

/// Snapshot slot backed by a single JSON file
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, payload: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, payload).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested").join("snapshot.json"));

        store.save("{\"properties\":[]}").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("{\"properties\":[]}"));
        assert!(!store.temp_path().exists());

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }
}
