//! Data models for mileage

pub mod cached_value;
pub mod fillup;
pub mod vehicle;

pub use cached_value::{CachedValue, StatGroup, StatisticRow};
pub use fillup::Fillup;
pub use vehicle::{DistanceUnit, EconomyUnit, Vehicle, VehicleId, VolumeUnit};
