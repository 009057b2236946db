use std::fmt::{Debug, Display, Formatter};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Utc>,

    /// Exclusive.
    pub end: DateTime<Utc>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} and {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

impl Interval {
    /// Billing granularity of both the rates and the consumption.
    pub const HALF_HOUR: TimeDelta = TimeDelta::minutes(30);

    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn half_hour_from(start: DateTime<Utc>) -> Self {
        Self::new(start, start + Self::HALF_HOUR)
    }

    #[must_use]
    pub fn duration(self) -> TimeDelta {
        self.end - self.start
    }

    #[must_use]
    pub fn contains(self, other: DateTime<Utc>) -> bool {
        (self.start <= other) && (other < self.end)
    }

    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        (self.start < other.end) && (other.start < self.end)
    }

    /// Iterate over the consecutive half-hour slots starting at the interval start.
    ///
    /// The last slot may stick out of the interval if the duration is not a multiple of 30 minutes.
    pub fn half_hours(self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(Self::half_hour_from(self.start)), |slot| {
            Some(Self::half_hour_from(slot.end))
        })
        .take_while(move |slot| slot.start < self.end)
    }
}
