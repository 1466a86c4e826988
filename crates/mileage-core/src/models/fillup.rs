//! Raw fill-up records supplied by the record source

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trip to the pump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fillup {
    pub date: NaiveDate,
    /// Odometer reading in the vehicle's distance unit
    pub odometer: f64,
    /// Fuel volume in the vehicle's volume unit
    pub volume: f64,
    /// Price per volume unit
    pub unit_price: f64,
    /// Tank was not filled completely
    #[serde(default)]
    pub partial: bool,
}

impl Fillup {
    pub fn new(date: NaiveDate, odometer: f64, volume: f64, unit_price: f64) -> Self {
        Self {
            date,
            odometer,
            volume,
            unit_price,
            partial: false,
        }
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    pub fn total_cost(&self) -> f64 {
        self.volume * self.unit_price
    }
}
