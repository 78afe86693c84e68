//! Mutation pipeline.
//!
//! Every write against the store that involves the backing service goes
//! through here. A mutation moves `Idle -> Pending -> Fulfilled | Rejected`
//! and back to `Idle` once acknowledged.
//!
//! Store transitions happen in one synchronous step after the service call
//! resolves; a rejected mutation leaves the store exactly as it was. At most
//! one mutation may be pending per identifier: a second one is rejected with
//! [`StoreError::MutationConflict`] instead of racing the first.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::normalizer;
use super::property_store::{read_store, write_store, SharedStore};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{Property, PropertyDraft};
use crate::domain::ports::PropertyService;

/// Unique identifier for a dispatched mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(pub Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A write request against the store.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Create a property; the backing service assigns the identifier
    Create { draft: PropertyDraft },
    /// Replace the attributes of a listed property
    Update { id: String, draft: PropertyDraft },
    Delete { id: String },
    /// Load one property and make it the selection
    FetchById { id: String },
}

impl Mutation {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::FetchById { .. } => "fetch_by_id",
        }
    }

    /// Identifier the mutation targets. Creates have none until the
    /// service answers.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { id, .. } | Self::Delete { id } | Self::FetchById { id } => Some(id),
        }
    }
}

/// Where a mutation is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Pending,
    Fulfilled,
    Rejected(String),
}

impl MutationPhase {
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Fulfilled | Self::Rejected(_))
    }
}

/// What a fulfilled mutation did.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Created(Property),
    Updated(Property),
    Deleted(String),
    Fetched(Property),
}

impl MutationOutcome {
    pub fn property_id(&self) -> &str {
        match self {
            Self::Created(property) | Self::Updated(property) | Self::Fetched(property) => {
                &property.id
            }
            Self::Deleted(id) => id,
        }
    }
}

/// Pending indicator returned by [`MutationPipeline::dispatch`].
#[derive(Debug)]
pub struct MutationHandle {
    pub id: MutationId,
    join: JoinHandle<StoreResult<MutationOutcome>>,
}

impl MutationHandle {
    /// Wait for the mutation to settle.
    pub async fn settled(self) -> StoreResult<MutationOutcome> {
        match self.join.await {
            Ok(result) => result,
            Err(err) => Err(StoreError::UpstreamFailure(format!(
                "mutation {} did not complete: {err}",
                self.id
            ))),
        }
    }
}

/// Releases the in-flight claim on an identifier when dropped.
struct InFlightClaim {
    in_flight: Arc<Mutex<HashSet<String>>>,
    id: Option<String>,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            lock(&self.in_flight).remove(&id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serializes mutations against one store.
#[derive(Clone)]
pub struct MutationPipeline {
    store: SharedStore,
    service: Arc<dyn PropertyService>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    phases: Arc<Mutex<HashMap<MutationId, MutationPhase>>>,
}

impl MutationPipeline {
    pub fn new(store: SharedStore, service: Arc<dyn PropertyService>) -> Self {
        Self {
            store,
            service,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            phases: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current phase of a mutation; unknown or acknowledged ids are `Idle`.
    pub fn phase(&self, id: MutationId) -> MutationPhase {
        lock(&self.phases)
            .get(&id)
            .cloned()
            .unwrap_or(MutationPhase::Idle)
    }

    /// Return a settled mutation to `Idle`. Pending mutations are left alone.
    pub fn acknowledge(&self, id: MutationId) -> MutationPhase {
        let mut phases = lock(&self.phases);
        if phases.get(&id).is_some_and(MutationPhase::is_settled) {
            phases.remove(&id).unwrap_or(MutationPhase::Idle)
        } else {
            phases.get(&id).cloned().unwrap_or(MutationPhase::Idle)
        }
    }

    /// Identifiers that currently have a mutation in flight.
    pub fn pending_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = lock(&self.in_flight).iter().cloned().collect();
        targets.sort();
        targets
    }

    /// Start a mutation in the background and return its pending indicator.
    ///
    /// The conflict check happens before this returns, so a second dispatch
    /// against the same identifier is rejected deterministically. The phase
    /// is tracked until [`acknowledge`](Self::acknowledge) is called.
    pub fn dispatch(&self, mutation: Mutation) -> MutationHandle {
        let id = MutationId::new();
        self.set_phase(id, MutationPhase::Pending);
        let claim = self.claim(id, &mutation);
        if let Err(err) = &claim {
            self.set_phase(id, MutationPhase::Rejected(err.to_string()));
        }
        let pipeline = self.clone();

        let join = tokio::spawn(async move {
            match claim {
                Ok(claim) => {
                    let result = pipeline.run(id, mutation, claim).await;
                    pipeline.set_phase(id, settled_phase(&result));
                    result
                }
                Err(err) => Err(err),
            }
        });

        MutationHandle { id, join }
    }

    /// Run a mutation to settlement on the caller's task.
    ///
    /// The caller holds the result, so no phase is tracked.
    pub async fn execute(&self, mutation: Mutation) -> StoreResult<MutationOutcome> {
        let id = MutationId::new();
        let claim = self.claim(id, &mutation)?;
        self.run(id, mutation, claim).await
    }

    fn claim(&self, id: MutationId, mutation: &Mutation) -> StoreResult<InFlightClaim> {
        let target = mutation.target().map(str::to_string);
        if let Some(target) = &target {
            let mut in_flight = lock(&self.in_flight);
            if !in_flight.insert(target.clone()) {
                drop(in_flight);
                let err = StoreError::MutationConflict(target.clone());
                tracing::warn!(
                    mutation_id = %id,
                    kind = mutation.kind(),
                    property_id = %target,
                    "mutation rejected: identifier already has a pending mutation"
                );
                return Err(err);
            }
        }

        Ok(InFlightClaim {
            in_flight: Arc::clone(&self.in_flight),
            id: target,
        })
    }

    async fn run(
        &self,
        id: MutationId,
        mutation: Mutation,
        claim: InFlightClaim,
    ) -> StoreResult<MutationOutcome> {
        let kind = mutation.kind();
        tracing::debug!(mutation_id = %id, kind, target = ?mutation.target(), "mutation pending");

        let result = self.perform(mutation).await;
        drop(claim);

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    mutation_id = %id,
                    kind,
                    property_id = %outcome.property_id(),
                    "mutation fulfilled"
                );
            }
            Err(err) => {
                tracing::warn!(mutation_id = %id, kind, error = %err, "mutation rejected");
            }
        }
        result
    }

    async fn perform(&self, mutation: Mutation) -> StoreResult<MutationOutcome> {
        match mutation {
            Mutation::Create { draft } => {
                draft.validate()?;
                let raw = self.service.create(&draft).await?;
                let property = normalizer::normalize(&raw)?;

                // the assigned id may already be claimed by an update or delete
                let in_flight = lock(&self.in_flight);
                if in_flight.contains(&property.id) {
                    return Err(StoreError::MutationConflict(property.id));
                }
                let mut store = write_store(&self.store);
                store.insert_created(property.clone())?;
                drop(in_flight);
                store.cache_mut().invalidate();
                Ok(MutationOutcome::Created(property))
            }
            Mutation::Update { id, draft } => {
                draft.validate()?;
                self.ensure_listed(&id)?;
                let raw = self.service.update(&id, &draft).await?;
                let now = Utc::now();
                let mut property = normalizer::normalize_at(&raw, now)?;
                if property.id != id {
                    return Err(StoreError::ValidationFailed(format!(
                        "update of {id} returned a record for {}",
                        property.id
                    )));
                }

                let mut store = write_store(&self.store);
                let created_at = store
                    .get(&id)
                    .map(|existing| existing.created_at)
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                stamp_update(&mut property, created_at, now);
                store.replace_in_place(property.clone())?;
                store.cache_mut().invalidate();
                Ok(MutationOutcome::Updated(property))
            }
            Mutation::Delete { id } => {
                self.ensure_known(&id)?;
                self.service.delete(&id).await?;

                let mut store = write_store(&self.store);
                store.remove(&id)?;
                store.cache_mut().invalidate();
                Ok(MutationOutcome::Deleted(id))
            }
            Mutation::FetchById { id } => {
                let raw = self.service.fetch(&id).await?;
                let property = normalizer::normalize(&raw)?;
                if property.id != id {
                    return Err(StoreError::ValidationFailed(format!(
                        "fetch of {id} returned a record for {}",
                        property.id
                    )));
                }

                write_store(&self.store).set_selected(property.clone())?;
                Ok(MutationOutcome::Fetched(property))
            }
        }
    }

    fn ensure_listed(&self, id: &str) -> StoreResult<()> {
        if read_store(&self.store).contains(id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    fn ensure_known(&self, id: &str) -> StoreResult<()> {
        if read_store(&self.store).lookup(id).is_some() {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    fn set_phase(&self, id: MutationId, phase: MutationPhase) {
        lock(&self.phases).insert(id, phase);
    }
}

impl fmt::Debug for MutationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationPipeline")
            .field("pending_targets", &self.pending_targets())
            .finish_non_exhaustive()
    }
}

fn settled_phase(result: &StoreResult<MutationOutcome>) -> MutationPhase {
    match result {
        Ok(_) => MutationPhase::Fulfilled,
        Err(err) => MutationPhase::Rejected(err.to_string()),
    }
}

/// Keep the original creation time and bump `updated_at`.
fn stamp_update(property: &mut Property, created_at: DateTime<Utc>, now: DateTime<Utc>) {
    property.created_at = created_at;
    property.updated_at = property.updated_at.max(now).max(created_at);
}
