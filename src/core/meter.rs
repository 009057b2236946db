use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::core::tariff::{Fuel, TariffCode};

/// Meter together with the tariff it's billed on.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, bon::Builder)]
pub struct Meter {
    pub fuel: Fuel,

    /// MPAN for electricity, MPRN for gas.
    #[builder(into)]
    pub point: String,

    #[builder(into)]
    pub serial_number: String,

    pub tariff_code: TariffCode,

    /// Only matters for electricity day/night tariffs.
    #[builder(default)]
    pub is_smart_meter: bool,
}

impl Display for Meter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fuel = match self.fuel {
            Fuel::Electricity => "electricity",
            Fuel::Gas => "gas",
        };
        write!(f, "{fuel}-{}-{}", self.point, self.serial_number)
    }
}
