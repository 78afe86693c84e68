//! Ports to the collaborators outside the cache.

pub mod property_service;
pub mod snapshot_store;

pub use property_service::{ListResponse, PropertyService};
pub use snapshot_store::SnapshotStore;
