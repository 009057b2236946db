use std::fmt::{Debug, Display, Formatter};

use crate::quantity::{Quantity, energy::KilowattHours, round_to};

/// Gas volume in cubic metres.
///
/// Gas meters report in m³ regardless of what the consumption endpoint documents.
pub type CubicMetres = Quantity<0, 1, 0>;

impl CubicMetres {
    /// Volume correction factor for standard temperature and pressure.
    pub const VOLUME_CORRECTION: f64 = 1.02264;

    /// Calorific value, MJ/m³.
    pub const CALORIFIC_VALUE: f64 = 40.0;

    /// Megajoules per kilowatt-hour.
    pub const MEGAJOULES_PER_KWH: f64 = 3.6;

    /// Convert to kilowatt-hours, rounded to watt-hours.
    #[must_use]
    pub fn to_kilowatt_hours(self) -> KilowattHours {
        let megajoules = self.0 * Self::VOLUME_CORRECTION * Self::CALORIFIC_VALUE;
        KilowattHours::from(round_to(megajoules / Self::MEGAJOULES_PER_KWH, 3))
    }
}

impl Display for CubicMetres {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m³", self.0)
    }
}

impl Debug for CubicMetres {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m³", self.0)
    }
}
