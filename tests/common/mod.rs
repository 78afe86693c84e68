//! Common test utilities for integration tests
//!
//! Shared fixtures and a scriptable property service used across the
//! integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use roost::domain::models::{FilterCriteria, PropertyDraft};
use roost::domain::ports::{ListResponse, PropertyService};
use roost::{StoreError, StoreResult};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Raw record in the rich backend shape
pub fn rich_record(id: &str, name: &str, price: f64) -> Value {
    json!({
        "idProperty": id,
        "name": name,
        "address": "Carrera 7 #12-40",
        "city": "Bogotá",
        "price": price,
        "codeInternal": format!("INT-{id}"),
        "year": 2015,
        "image": format!("https://img.example.com/{id}.jpg"),
        "owner": { "idOwner": "o-1", "name": "Ana Ruiz" },
        "traces": [
            { "idPropertyTrace": format!("{id}-t1"), "dateSale": "2019-04-01", "name": "First sale", "value": price * 0.8, "tax": 1200 }
        ]
    })
}

/// Raw record in the flat mock shape
pub fn flat_record(id: &str, name: &str, kind: &str, price: f64) -> Value {
    json!({
        "id": id,
        "name": name,
        "address": "12 Elm Street",
        "city": "Springfield",
        "price": price,
        "type": kind,
        "area": 120,
        "unit": "m²",
        "bedrooms": 3,
        "status": "available"
    })
}

/// Raw record in the generic fallback shape
pub fn generic_record(id: &str, price: f64) -> Value {
    json!({ "id": id, "name": format!("Listing {id}"), "address": "1 Main St", "price": price })
}

/// Property service whose answers and latencies are scripted per identifier.
///
/// Created properties get the id `"{name}-id"` (lowercased name), so tests can
/// predict identifiers before the service answers.
#[derive(Default)]
pub struct ScriptedService {
    listing: Mutex<Vec<Value>>,
    delays: Mutex<HashMap<String, u64>>,
    failing: Mutex<HashSet<String>>,
    list_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn with_listing(records: Vec<Value>) -> Self {
        Self {
            listing: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Delay every call that targets `key` (an id, or a draft name for creates).
    pub fn delay(&self, key: &str, millis: u64) {
        self.delays.lock().unwrap().insert(key.to_string(), millis);
    }

    /// Make every call that targets `key` fail upstream.
    pub fn fail(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self, key: &str) -> StoreResult<()> {
        let delay = self.delays.lock().unwrap().get(key).copied();
        if let Some(millis) = delay {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        if self.failing.lock().unwrap().contains(key) {
            return Err(StoreError::UpstreamFailure(format!("503 for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyService for ScriptedService {
    async fn list(&self, _criteria: &FilterCriteria, _page: u64, _limit: u64) -> StoreResult<ListResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.gate("list").await?;
        Ok(ListResponse {
            records: self.listing.lock().unwrap().clone(),
            pagination: None,
        })
    }

    async fn fetch(&self, id: &str) -> StoreResult<Value> {
        self.gate(id).await?;
        Ok(rich_record(id, &format!("Fetched {id}"), 450_000.0))
    }

    async fn create(&self, draft: &PropertyDraft) -> StoreResult<Value> {
        self.gate(&draft.name).await?;
        Ok(json!({
            "idProperty": format!("{}-id", draft.name.to_lowercase()),
            "name": draft.name,
            "price": draft.price,
            "status": draft.status.as_str(),
        }))
    }

    async fn update(&self, id: &str, draft: &PropertyDraft) -> StoreResult<Value> {
        self.gate(id).await?;
        Ok(json!({
            "idProperty": id,
            "name": draft.name,
            "price": draft.price,
            "status": draft.status.as_str(),
        }))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.gate(id).await
    }
}
