use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    core::interval::Interval,
    quantity::{cost::Pence, rate::KilowattHourRate},
};

/// Normalized half-hourly unit rate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub interval: Interval,
    pub value_exc_vat: KilowattHourRate,
    pub value_inc_vat: KilowattHourRate,
}

/// Unit rate as returned by the supplier.
///
/// The validity may span many half-hours or be open-ended on either side.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct RawRate {
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub value_exc_vat: KilowattHourRate,
    pub value_inc_vat: KilowattHourRate,
}

impl RawRate {
    #[must_use]
    pub fn covers(&self, timestamp: DateTime<Utc>) -> bool {
        self.valid_from.is_none_or(|valid_from| valid_from <= timestamp)
            && self.valid_to.is_none_or(|valid_to| timestamp < valid_to)
    }
}

/// Daily standing charge, the first one valid within the requested period.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingCharge {
    pub value_exc_vat: Pence,
    pub value_inc_vat: Pence,
}
