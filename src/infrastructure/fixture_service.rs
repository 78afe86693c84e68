//! Property service backed by a local JSON file of raw records
//!
//! Used by the CLI and tests in place of a network backend. The file holds an
//! array of raw records in any shape the normalizer accepts; writes go back to
//! the same file.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{FilterCriteria, PropertyDraft};
use crate::domain::ports::{ListResponse, PropertyService};
use crate::services::normalizer;

/// Raw-record service over a JSON array file
///
/// The file is served as one unpaged result; filtering and paging happen in
/// the store.
#[derive(Debug)]
pub struct JsonFileService {
    path: Option<PathBuf>,
    records: RwLock<Vec<Value>>,
}

impl JsonFileService {
    /// Load records from `path`. A missing file is an empty source.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let records = match tokio::fs::read_to_string(&path).await {
            Ok(payload) => parse_records(&payload)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "fixture file not found, starting empty");
                Vec::new()
            }
            Err(err) => {
                return Err(StoreError::UpstreamFailure(format!(
                    "cannot read {}: {err}",
                    path.display()
                )))
            }
        };

        tracing::debug!(path = %path.display(), records = records.len(), "fixtures loaded");
        Ok(Self {
            path: Some(path),
            records: RwLock::new(records),
        })
    }

    /// In-memory source that never touches disk.
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            path: None,
            records: RwLock::new(records),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn persist(&self, records: &[Value]) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let payload = serde_json::to_string_pretty(records)?;
        tokio::fs::write(path, payload).await.map_err(|err| {
            StoreError::UpstreamFailure(format!("cannot write {}: {err}", path.display()))
        })
    }
}

/// Accepts a bare array or an object wrapping one under `data`.
fn parse_records(payload: &str) -> StoreResult<Vec<Value>> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Array(records) => Ok(records),
        Value::Object(mut wrapper) => match wrapper.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(StoreError::UpstreamFailure(
                "fixture file must hold an array of records".to_string(),
            )),
        },
        _ => Err(StoreError::UpstreamFailure(
            "fixture file must hold an array of records".to_string(),
        )),
    }
}

/// Raw rich-shape record for a draft.
fn draft_record(id: &str, draft: &PropertyDraft) -> StoreResult<Value> {
    let mut record = match serde_json::to_value(draft)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    record.insert("idProperty".to_string(), Value::String(id.to_string()));
    Ok(Value::Object(record))
}

fn position(records: &[Value], id: &str) -> Option<usize> {
    records
        .iter()
        .position(|record| normalizer::record_id(record).as_deref() == Some(id))
}

#[async_trait]
impl PropertyService for JsonFileService {
    async fn list(&self, _criteria: &FilterCriteria, _page: u64, _limit: u64) -> StoreResult<ListResponse> {
        Ok(ListResponse {
            records: self.records.read().await.clone(),
            pagination: None,
        })
    }

    async fn fetch(&self, id: &str) -> StoreResult<Value> {
        let records = self.records.read().await;
        position(&records, id)
            .map(|index| records[index].clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create(&self, draft: &PropertyDraft) -> StoreResult<Value> {
        let id = Uuid::new_v4().to_string();
        let record = draft_record(&id, draft)?;

        let mut records = self.records.write().await;
        records.insert(0, record.clone());
        self.persist(&records).await?;
        Ok(record)
    }

    async fn update(&self, id: &str, draft: &PropertyDraft) -> StoreResult<Value> {
        let mut records = self.records.write().await;
        let index = position(&records, id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut record = draft_record(id, draft)?;
        if let (Some(created), Value::Object(map)) = (
            records[index].get("createdAt").cloned(),
            &mut record,
        ) {
            map.insert("createdAt".to_string(), created);
        }
        records[index] = record.clone();
        self.persist(&records).await?;
        Ok(record)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let index = position(&records, id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        records.remove(index);
        self.persist(&records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty_source() {
        let dir = TempDir::new().unwrap();
        let service = JsonFileService::open(dir.path().join("none.json")).await.unwrap();
        let response = service.list(&FilterCriteria::default(), 1, 10).await.unwrap();
        assert!(response.records.is_empty());
    }

    #[tokio::test]
    async fn test_wrapped_array_and_fetch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(
            &path,
            json!({ "data": [{ "id": "a", "name": "A", "address": "x", "price": 1 }] }).to_string(),
        )
        .unwrap();

        let service = JsonFileService::open(&path).await.unwrap();
        assert_eq!(service.fetch("a").await.unwrap()["name"], "A");
        assert!(matches!(service.fetch("b").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_update_delete_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("listings.json");
        std::fs::write(&path, "[]").unwrap();
        let service = JsonFileService::open(&path).await.unwrap();

        let created = service.create(&PropertyDraft::new("Loft", 250_000.0)).await.unwrap();
        let id = normalizer::record_id(&created).unwrap();
        let property = normalizer::normalize(&created).unwrap();
        assert_eq!(property.id, id);
        assert_eq!(property.name, "Loft");

        service.update(&id, &PropertyDraft::new("Loft B", 260_000.0)).await.unwrap();
        let reopened = JsonFileService::open(&path).await.unwrap();
        assert_eq!(reopened.fetch(&id).await.unwrap()["name"], "Loft B");

        reopened.delete(&id).await.unwrap();
        assert!(matches!(reopened.delete(&id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_not_an_array_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "42").unwrap();
        assert!(JsonFileService::open(&path).await.is_err());
    }
}
