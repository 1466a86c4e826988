//! mileage-core - Core library for mileage
//!
//! Derived vehicle statistics with a persistent cache, background recompute
//! jobs, and a controller that serves cached values while they refresh.

pub mod cache;
pub mod controller;
pub mod error;
pub mod event;
pub mod job;
pub mod models;
pub mod source;
pub mod statistics;

pub use cache::{CacheStats, CacheStore};
pub use controller::{RetainedState, Selection, StatsConfig, StatsController};
pub use error::{CoreError, Result};
pub use event::{EventBus, StatsEvent};
pub use job::{JobContext, JobProgress, JobStatus, RecomputeJob};
pub use source::{MemoryRecordSource, RecordSource};
pub use statistics::{DetailView, StatisticDefinition, StatisticRegistry};
