//! Roost - normalized property listing cache
//!
//! Roost ingests property records from heterogeneous upstream shapes, keeps
//! one canonical copy of each entity, and serves filtered and paginated views
//! over them with explicit cache freshness and serialized mutations.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): canonical models, errors and ports
//! - **Service Layer** (`services`): normalizer, store, filter engine,
//!   pagination, cache controller, mutation pipeline and the store facade
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging,
//!   snapshot files and a JSON-file property service
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use roost::{InsertMode, JsonFileService, StoreFacade};
//!
//! let facade = StoreFacade::new(Arc::new(JsonFileService::from_records(vec![])));
//! facade.ingest(&records, InsertMode::Append);
//! let stats = facade.select_stats();
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{StoreError, StoreResult};
pub use domain::models::{
    BasicFilter, Config, FilterCriteria, Page, PageInfo, Property, PropertyCategory,
    PropertyDraft, PropertyStats, PropertyStatus,
};
pub use domain::ports::{ListResponse, PropertyService, SnapshotStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::{FileSnapshotStore, JsonFileService};
pub use services::{
    CacheController, FetchOutcome, IngestReport, InsertMode, Mutation, MutationOutcome,
    MutationPhase, PropertyStore, StoreFacade,
};
