use serde::{Deserialize, Serialize};

use crate::core::interval::Interval;

/// Metered consumption over a half-hour.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub interval: Interval,

    /// Reading in the meter's native unit: kWh for electricity and m³ for gas.
    pub value: f64,
}

impl Consumption {
    pub const fn new(interval: Interval, value: f64) -> Self {
        Self { interval, value }
    }
}
