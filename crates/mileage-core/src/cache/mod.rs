//! Caching layer for mileage-core
//!
//! Provides the SQLite-backed statistic cache shared by the recompute job
//! (writer) and the controller (reader).

pub mod store;

pub use store::{CacheStats, CacheStore, CACHE_FILE};
