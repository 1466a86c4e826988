//! Vehicle snapshot and unit preferences
//!
//! A `Vehicle` is loaded once per selection and shared read-only (behind
//! `Arc`) with the recompute job for the duration of one computation cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for vehicle ID - zero-cost type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(i64);

impl VehicleId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw value as stored in the cache database
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for VehicleId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn abbreviation(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mi",
            DistanceUnit::Kilometers => "km",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "mile",
            DistanceUnit::Kilometers => "kilometer",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    #[default]
    Gallons,
    ImperialGallons,
    Litres,
}

impl VolumeUnit {
    pub fn abbreviation(self) -> &'static str {
        match self {
            VolumeUnit::Gallons => "gal",
            VolumeUnit::ImperialGallons => "imp gal",
            VolumeUnit::Litres => "L",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            VolumeUnit::Gallons => "gallon",
            VolumeUnit::ImperialGallons => "imperial gallon",
            VolumeUnit::Litres => "litre",
        }
    }
}

/// How fuel economy is expressed for a vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EconomyUnit {
    /// Distance travelled per unit of fuel (MPG, km/L)
    #[default]
    DistancePerVolume,
    /// Fuel burned per 100 distance units (L/100km)
    VolumePer100Distance,
}

/// Read-only snapshot of a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub title: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub distance_unit: DistanceUnit,
    #[serde(default)]
    pub volume_unit: VolumeUnit,
    #[serde(default)]
    pub economy_unit: EconomyUnit,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "$".to_string()
}

impl Vehicle {
    /// Vehicle with default (US) units
    pub fn new(id: VehicleId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            make: None,
            model: None,
            year: None,
            distance_unit: DistanceUnit::default(),
            volume_unit: VolumeUnit::default(),
            economy_unit: EconomyUnit::default(),
            currency: default_currency(),
        }
    }

    pub fn with_units(
        mut self,
        distance_unit: DistanceUnit,
        volume_unit: VolumeUnit,
        economy_unit: EconomyUnit,
    ) -> Self {
        self.distance_unit = distance_unit;
        self.volume_unit = volume_unit;
        self.economy_unit = economy_unit;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Economy unit label, e.g. "MPG", "km/L" or "L/100km"
    pub fn economy_abbreviation(&self) -> String {
        let distance = self.distance_unit.abbreviation();
        let volume = self.volume_unit.abbreviation();
        match self.economy_unit {
            EconomyUnit::DistancePerVolume => match (self.distance_unit, self.volume_unit) {
                (DistanceUnit::Miles, VolumeUnit::Gallons) => "MPG".to_string(),
                (DistanceUnit::Miles, VolumeUnit::ImperialGallons) => "MPG (imp)".to_string(),
                _ => format!("{}/{}", distance, volume),
            },
            EconomyUnit::VolumePer100Distance => format!("{}/100{}", volume, distance),
        }
    }

    /// Convert a raw distance-per-volume ratio into this vehicle's economy unit
    pub fn economy_from_ratio(&self, distance_per_volume: f64) -> f64 {
        match self.economy_unit {
            EconomyUnit::DistancePerVolume => distance_per_volume,
            EconomyUnit::VolumePer100Distance => 100.0 / distance_per_volume,
        }
    }

    /// Human-readable name: "2009 Honda Fit" or the title
    pub fn display_name(&self) -> String {
        match (&self.year, &self.make, &self.model) {
            (Some(year), Some(make), Some(model)) => format!("{} {} {}", year, make, model),
            _ => self.title.clone(),
        }
    }
}
