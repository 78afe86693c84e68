//! Service layer: the cache subsystem built on the domain models.

pub mod cache_controller;
pub mod fetch_coordinator;
pub mod filter_engine;
pub mod mutation_pipeline;
pub mod normalizer;
pub mod pagination;
pub mod property_store;
pub mod store_facade;

pub use cache_controller::{CacheController, CACHE_TTL_SECS};
pub use fetch_coordinator::{FetchCoordinator, FetchOutcome};
pub use mutation_pipeline::{
    Mutation, MutationHandle, MutationId, MutationOutcome, MutationPhase, MutationPipeline,
};
pub use normalizer::RecordShape;
pub use property_store::{
    IngestReport, InsertMode, PropertyStore, RejectedRecord, SharedStore, StoreSnapshot,
};
pub use store_facade::StoreFacade;
