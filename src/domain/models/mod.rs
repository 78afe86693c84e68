pub mod config;
pub mod filter;
pub mod pagination;
pub mod property;
pub mod stats;

pub use config::{Config, FixturesConfig, LoggingConfig, PaginationConfig, SnapshotConfig};
pub use filter::{BasicFilter, FilterCriteria, EXPENSIVE_THRESHOLD, MAX_PRICE_SENTINEL};
pub use pagination::{Page, PageInfo};
pub use property::{
    Address, AreaUnit, ImageRef, Location, OwnerSummary, Property, PropertyCategory,
    PropertyDraft, PropertyImage, PropertyStatus, PropertyTrace,
};
pub use stats::PropertyStats;
