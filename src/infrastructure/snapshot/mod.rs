//! Session snapshot persistence

pub mod file_store;

pub use file_store::FileSnapshotStore;
