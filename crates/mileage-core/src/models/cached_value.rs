//! Cache rows and the presentation rows derived from them

use super::VehicleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Display section a statistic belongs to
///
/// Declaration order is the display order; `rank()` is what the cache stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGroup {
    Economy,
    Distance,
    Fuel,
    Cost,
    Price,
}

impl StatGroup {
    pub const ALL: [StatGroup; 5] = [
        StatGroup::Economy,
        StatGroup::Distance,
        StatGroup::Fuel,
        StatGroup::Cost,
        StatGroup::Price,
    ];

    pub fn rank(self) -> i64 {
        match self {
            StatGroup::Economy => 0,
            StatGroup::Distance => 1,
            StatGroup::Fuel => 2,
            StatGroup::Cost => 3,
            StatGroup::Price => 4,
        }
    }

    /// Inverse of `rank`; `None` for ranks written by a different catalog version
    pub fn from_rank(rank: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.rank() == rank)
    }

    pub fn name(self) -> &'static str {
        match self {
            StatGroup::Economy => "Fuel economy",
            StatGroup::Distance => "Distance",
            StatGroup::Fuel => "Fuel",
            StatGroup::Cost => "Cost",
            StatGroup::Price => "Fuel price",
        }
    }
}

impl fmt::Display for StatGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One cached statistic result for a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedValue {
    pub vehicle_id: VehicleId,
    pub key: String,
    pub value: f64,
    pub group: StatGroup,
    pub order: u32,
    pub valid: bool,
}

impl CachedValue {
    /// Sort key shared by the store query and the registry
    pub fn position(&self) -> (StatGroup, u32) {
        (self.group, self.order)
    }
}

/// What the presentation layer renders for one statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticRow {
    pub key: String,
    pub label: String,
    pub value: String,
    pub group: StatGroup,
    pub has_detail: bool,
}
