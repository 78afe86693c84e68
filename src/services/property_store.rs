//! Normalized property store.
//!
//! Entities live once in `by_id`; every view is a list of identifiers into
//! that map. `all_ids` and `by_id` always describe the same set of
//! properties, and `filtered_ids` is recomputed eagerly after every change
//! so reads never pay for the derivation.
//!
//! The only exception to the bijection is a *detached selection*: a record
//! loaded by id that is not part of the listing. It is held next to the
//! selection, never inside `by_id`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cache_controller::CacheController;
use super::{filter_engine, normalizer};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{FilterCriteria, Property, PropertyStats};

/// Where identifiers new to the listing are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Fetch semantics: new identifiers go to the end
    Append,
    /// Creation semantics: new identifiers go to the front
    Prepend,
    /// Refetch semantics: the batch becomes the whole listing
    Replace,
}

/// A record that was refused during batch ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position of the record in the submitted batch
    pub index: usize,
    pub error: StoreError,
}

/// Outcome of a batch ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Identifiers written to the store, in batch order
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectedRecord>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Serializable store contents for session persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Listed properties in `all_ids` order
    pub properties: Vec<Property>,
    #[serde(default)]
    pub selected_id: Option<String>,
    #[serde(default)]
    pub criteria: FilterCriteria,
}

/// Store handle shared by the facade, the mutation pipeline and fetch
/// orchestration.
pub type SharedStore = Arc<RwLock<PropertyStore>>;

/// Every store transition is a complete synchronous step, so a poisoned
/// lock still guards consistent data.
pub fn read_store(store: &SharedStore) -> RwLockReadGuard<'_, PropertyStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_store(store: &SharedStore) -> RwLockWriteGuard<'_, PropertyStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// The normalized store.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    by_id: HashMap<String, Property>,
    all_ids: Vec<String>,
    filtered_ids: Vec<String>,
    criteria: FilterCriteria,
    selected_id: Option<String>,
    detached: Option<Property>,
    cache: CacheController,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store in a shared handle.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&Property> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn all_ids(&self) -> &[String] {
        &self.all_ids
    }

    pub fn filtered_ids(&self) -> &[String] {
        &self.filtered_ids
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub const fn cache(&self) -> &CacheController {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut CacheController {
        &mut self.cache
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// The selected property, whether listed or detached.
    pub fn selected(&self) -> Option<&Property> {
        let id = self.selected_id.as_deref()?;
        self.by_id
            .get(id)
            .or_else(|| self.detached.as_ref().filter(|property| property.id == id))
    }

    /// Listed record, falling back to the detached selection.
    pub fn lookup(&self, id: &str) -> Option<&Property> {
        self.by_id
            .get(id)
            .or_else(|| self.detached.as_ref().filter(|property| property.id == id))
    }

    /// Filtered identifiers resolved to their records.
    pub fn filtered(&self) -> Vec<&Property> {
        self.filtered_ids
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    /// Identifiers matching `criteria` without touching the stored view.
    pub fn view_for(&self, criteria: &FilterCriteria) -> Vec<String> {
        filter_engine::apply(&self.all_ids, &self.by_id, criteria)
    }

    /// Aggregates over every listed property, regardless of the filter.
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> PropertyStats {
        let listed: Vec<&Property> = self.all_ids.iter().filter_map(|id| self.by_id.get(id)).collect();
        if listed.is_empty() {
            return PropertyStats::default();
        }

        let prices = listed.iter().map(|property| property.price);
        let total: f64 = prices.clone().sum();
        PropertyStats {
            count: listed.len(),
            available_count: listed.iter().filter(|property| property.is_available()).count(),
            expensive_count: listed.iter().filter(|property| property.is_expensive()).count(),
            min_price: prices.clone().reduce(f64::min),
            avg_price: Some(total / listed.len() as f64),
            max_price: prices.reduce(f64::max),
        }
    }

    /// Whether the map/list invariants hold.
    pub fn check_invariants(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.all_ids.len());
        let unique_and_present = self
            .all_ids
            .iter()
            .all(|id| seen.insert(id.as_str()) && self.by_id.contains_key(id));
        if !unique_and_present || self.by_id.len() != self.all_ids.len() {
            return false;
        }

        // filtered_ids must be a subsequence of all_ids
        let mut listed = self.all_ids.iter();
        self.filtered_ids
            .iter()
            .all(|id| listed.any(|candidate| candidate == id))
    }

    // ---------------------------------------------------------------------
    // Ingestion
    // ---------------------------------------------------------------------

    /// Normalize and store a batch of raw records.
    ///
    /// Malformed or invalid records are rejected individually; the rest of
    /// the batch is still written.
    pub fn ingest(&mut self, raw: &[Value], mode: InsertMode, now: DateTime<Utc>) -> IngestReport {
        let mut rejected = Vec::new();
        let mut entities = Vec::with_capacity(raw.len());

        for (index, record) in raw.iter().enumerate() {
            match normalizer::normalize_at(record, now) {
                Ok(property) => entities.push((index, property)),
                Err(error) => {
                    tracing::warn!(index, error = %error, "rejected raw property record");
                    rejected.push(RejectedRecord { index, error });
                }
            }
        }

        let mut report = self.upsert_indexed(entities, mode);
        report.rejected.extend(rejected);
        report.rejected.sort_by_key(|rejection| rejection.index);
        report
    }

    /// Merge canonical entities into the store.
    pub fn upsert_many(&mut self, entities: impl IntoIterator<Item = Property>, mode: InsertMode) -> IngestReport {
        self.upsert_indexed(entities.into_iter().enumerate().collect(), mode)
    }

    fn upsert_indexed(&mut self, entities: Vec<(usize, Property)>, mode: InsertMode) -> IngestReport {
        let mut report = IngestReport::default();
        let mut fresh_ids = Vec::new();

        if mode == InsertMode::Replace {
            if let Some(selected) = self.selected_id.as_deref().and_then(|id| self.by_id.get(id)) {
                self.detached = Some(selected.clone());
            }
            self.by_id.clear();
            self.all_ids.clear();
        }

        for (index, property) in entities {
            if let Err(error) = property.validate() {
                tracing::warn!(index, property_id = %property.id, error = %error, "rejected property");
                report.rejected.push(RejectedRecord { index, error });
                continue;
            }

            let id = property.id.clone();
            if !self.by_id.contains_key(&id) {
                fresh_ids.push(id.clone());
            }
            if self.detached.as_ref().is_some_and(|detached| detached.id == id) {
                self.detached = None;
            }
            self.by_id.insert(id.clone(), property);
            report.accepted.push(id);
        }

        match mode {
            InsertMode::Append | InsertMode::Replace => self.all_ids.extend(fresh_ids),
            InsertMode::Prepend => {
                fresh_ids.append(&mut self.all_ids);
                self.all_ids = fresh_ids;
            }
        }

        self.refilter();
        tracing::debug!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            total = self.all_ids.len(),
            "upserted properties"
        );
        report
    }

    /// Replace the whole listing with a freshly fetched batch.
    pub fn replace_all(&mut self, entities: impl IntoIterator<Item = Property>) -> IngestReport {
        self.upsert_many(entities, InsertMode::Replace)
    }

    // ---------------------------------------------------------------------
    // Mutation primitives
    // ---------------------------------------------------------------------

    /// Insert a newly created property at the front of the listing.
    ///
    /// The filtered view takes it in when it passes the current basic
    /// filter, so an `expensive` view shows a new expensive listing without a
    /// refetch.
    pub fn insert_created(&mut self, property: Property) -> StoreResult<()> {
        property.validate()?;
        let id = property.id.clone();

        if self.by_id.contains_key(&id) {
            return self.replace_in_place(property).map(|_| ());
        }

        let shown = filter_engine::passes_basic(&property, self.criteria.basic);
        self.by_id.insert(id.clone(), property);
        self.all_ids.insert(0, id.clone());
        if shown {
            self.filtered_ids.insert(0, id);
        }
        Ok(())
    }

    /// Replace an existing record without moving it in the listing.
    pub fn replace_in_place(&mut self, property: Property) -> StoreResult<Property> {
        property.validate()?;
        let Some(slot) = self.by_id.get_mut(&property.id) else {
            return Err(StoreError::NotFound(property.id));
        };

        let previous = std::mem::replace(slot, property);
        self.refilter();
        Ok(previous)
    }

    /// Remove a property from every structure; clears the selection if it
    /// pointed at it.
    pub fn remove(&mut self, id: &str) -> StoreResult<Property> {
        let removed = match self.by_id.remove(id) {
            Some(property) => {
                self.all_ids.retain(|listed| listed != id);
                self.filtered_ids.retain(|listed| listed != id);
                property
            }
            None => match self.detached.take() {
                Some(detached) if detached.id == id => detached,
                other => {
                    self.detached = other;
                    return Err(StoreError::NotFound(id.to_string()));
                }
            },
        };

        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
            self.detached = None;
        }
        Ok(removed)
    }

    /// Make `property` the selected entity.
    ///
    /// A listed record is replaced in place; an unlisted one is kept as the
    /// detached selection. The listing itself is unchanged.
    pub fn set_selected(&mut self, property: Property) -> StoreResult<()> {
        property.validate()?;
        let id = property.id.clone();

        if self.by_id.contains_key(&id) {
            self.replace_in_place(property)?;
            self.detached = None;
        } else {
            self.detached = Some(property);
        }
        self.selected_id = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
        self.detached = None;
    }

    /// Empty the store and mark the cache stale.
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.all_ids.clear();
        self.filtered_ids.clear();
        self.clear_selection();
        self.cache.invalidate();
    }

    // ---------------------------------------------------------------------
    // Filtering
    // ---------------------------------------------------------------------

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    pub fn reset_criteria(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    /// Re-derive `filtered_ids` from the current listing and criteria.
    pub fn refilter(&mut self) {
        self.filtered_ids = filter_engine::apply(&self.all_ids, &self.by_id, &self.criteria);
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            properties: self
                .all_ids
                .iter()
                .filter_map(|id| self.by_id.get(id).cloned())
                .collect(),
            selected_id: self.selected_id.clone().filter(|id| self.by_id.contains_key(id)),
            criteria: self.criteria.clone(),
        }
    }

    /// Rebuild a store from a snapshot. The cache starts stale.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> (Self, IngestReport) {
        let mut store = Self {
            criteria: snapshot.criteria,
            ..Self::default()
        };
        let report = store.upsert_many(snapshot.properties, InsertMode::Append);
        store.selected_id = snapshot.selected_id.filter(|id| store.by_id.contains_key(id));
        (store, report)
    }
}
