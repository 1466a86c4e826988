//! Error types for mileage-core
//!
//! One thiserror hierarchy for the whole library. Per-statistic failures are
//! recovered inside the recompute job and never escape it; everything else is
//! returned to the caller, who owns the retry policy.

use crate::models::VehicleId;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for mileage operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Storage Errors
    // ===================
    #[error("Cache storage failure during {operation}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to create cache directory: {path}")]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache lock poisoned")]
    LockPoisoned,

    // ===================
    // Record Source Errors
    // ===================
    #[error("Records unavailable for vehicle {vehicle_id}: {reason}")]
    SourceUnavailable { vehicle_id: VehicleId, reason: String },

    #[error("Vehicle not found: {vehicle_id}")]
    VehicleNotFound { vehicle_id: VehicleId },

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {path}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ===================
    // Statistic Errors
    // ===================
    #[error("Statistic {key} failed to evaluate: {message}")]
    StatisticEvaluation { key: String, message: String },

    #[error("Duplicate statistic key in registry: {key}")]
    DuplicateStatistic { key: String },

    // ===================
    // Controller Errors
    // ===================
    #[error("No vehicle selected")]
    NoVehicleSelected,

    #[error("Recompute job for vehicle {vehicle_id} was already started")]
    JobAlreadyStarted { vehicle_id: VehicleId },

    #[error("Recompute jobs must be started from within a Tokio runtime")]
    RuntimeUnavailable,
}

impl CoreError {
    /// Wrap a rusqlite error with the store operation that produced it
    pub(crate) fn storage(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| CoreError::Storage { operation, source }
    }

    /// Storage and source failures are worth retrying; programming errors are not
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Storage { .. }
                | CoreError::LockPoisoned
                | CoreError::SourceUnavailable { .. }
                | CoreError::FileRead { .. }
        )
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
