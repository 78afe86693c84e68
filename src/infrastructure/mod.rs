//! Infrastructure layer
//!
//! Adapters for the domain ports plus process-level concerns:
//! - Configuration loading and validation
//! - Logging setup
//! - File-backed session snapshots
//! - A JSON-file property service

pub mod config;
pub mod fixture_service;
pub mod logging;
pub mod snapshot;

pub use config::{ConfigError, ConfigLoader};
pub use fixture_service::JsonFileService;
pub use logging::{LogConfig, LoggerImpl};
pub use snapshot::FileSnapshotStore;
