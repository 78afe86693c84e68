//! Domain layer for the roost property cache
//!
//! Canonical entity model, filter criteria, errors and the ports through
//! which the cache talks to the outside world.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{StoreError, StoreResult};
