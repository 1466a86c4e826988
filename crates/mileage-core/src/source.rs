//! Raw record source
//!
//! The transactional store that owns vehicles and fill-ups lives outside this
//! crate; the core only reads through `RecordSource`. `MemoryRecordSource`
//! is the in-process implementation used by the CLI (loaded from a JSON
//! fixture) and by tests.

use crate::error::{CoreError, Result};
use crate::models::{Fillup, Vehicle, VehicleId};
use dashmap::DashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Read access to vehicles and their fill-ups
pub trait RecordSource: Send + Sync {
    /// Snapshot of one vehicle, `VehicleNotFound` if it doesn't exist
    fn vehicle(&self, id: VehicleId) -> Result<Vehicle>;

    /// Every fill-up recorded for a vehicle, in any order
    ///
    /// Failure to read is reported as `SourceUnavailable`.
    fn fillups(&self, id: VehicleId) -> Result<Vec<Fillup>>;

    /// All known vehicles, sorted by id
    fn vehicles(&self) -> Result<Vec<Vehicle>>;
}

/// Fixture file layout: `{ "vehicles": [ { ..vehicle, "fillups": [..] } ] }`
#[derive(Debug, Deserialize)]
struct Fixture {
    vehicles: Vec<FixtureVehicle>,
}

#[derive(Debug, Deserialize)]
struct FixtureVehicle {
    #[serde(flatten)]
    vehicle: Vehicle,
    #[serde(default)]
    fillups: Vec<Fillup>,
}

/// In-memory record source
#[derive(Default)]
pub struct MemoryRecordSource {
    vehicles: DashMap<VehicleId, Vehicle>,
    fillups: DashMap<VehicleId, Vec<Fillup>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load vehicles and fill-ups from a JSON fixture
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: Fixture =
            serde_json::from_str(&content).map_err(|source| CoreError::JsonParse {
                path: path.to_path_buf(),
                source,
            })?;

        let records = Self::new();
        for entry in fixture.vehicles {
            let id = entry.vehicle.id;
            records.insert_vehicle(entry.vehicle);
            records.fillups.insert(id, entry.fillups);
        }

        debug!(
            path = %path.display(),
            vehicles = records.vehicles.len(),
            "Records loaded from fixture"
        );
        Ok(records)
    }

    pub fn into_shared(self) -> Arc<dyn RecordSource> {
        Arc::new(self)
    }

    pub fn insert_vehicle(&self, vehicle: Vehicle) {
        self.fillups.entry(vehicle.id).or_default();
        self.vehicles.insert(vehicle.id, vehicle);
    }

    /// Record a fill-up; callers are expected to tell the controller
    /// (`records_changed`) so cached statistics get recomputed
    pub fn add_fillup(&self, id: VehicleId, fillup: Fillup) {
        self.fillups.entry(id).or_default().push(fillup);
    }

    pub fn remove_vehicle(&self, id: VehicleId) {
        self.vehicles.remove(&id);
        self.fillups.remove(&id);
    }
}

impl RecordSource for MemoryRecordSource {
    fn vehicle(&self, id: VehicleId) -> Result<Vehicle> {
        self.vehicles
            .get(&id)
            .map(|v| v.value().clone())
            .ok_or(CoreError::VehicleNotFound { vehicle_id: id })
    }

    fn fillups(&self, id: VehicleId) -> Result<Vec<Fillup>> {
        self.fillups
            .get(&id)
            .map(|f| f.value().clone())
            .ok_or_else(|| CoreError::SourceUnavailable {
                vehicle_id: id,
                reason: "no fill-up records for vehicle".to_string(),
            })
    }

    fn vehicles(&self) -> Result<Vec<Vehicle>> {
        let mut vehicles: Vec<_> = self.vehicles.iter().map(|v| v.value().clone()).collect();
        vehicles.sort_by_key(|v| v.id);
        Ok(vehicles)
    }
}
