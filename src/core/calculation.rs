use chrono::{DateTime, Utc};

use crate::core::{consumption::Consumption, normalize::sort_consumption};

/// Outcome of an incremental calculation.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum Calculation<T> {
    /// Not enough data yet: try again on the next cycle.
    Pending,

    /// Nothing new since the last calculation: keep using the previous result.
    Unchanged,

    Ready(T),
}

impl<T> Calculation<T> {
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending | Self::Unchanged => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Calculation<U> {
        match self {
            Self::Pending => Calculation::Pending,
            Self::Unchanged => Calculation::Unchanged,
            Self::Ready(value) => Calculation::Ready(f(value)),
        }
    }

    /// Split off the ready value and pass the other outcomes through.
    pub fn branch<U>(self) -> Result<T, Calculation<U>> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Pending => Err(Calculation::Pending),
            Self::Unchanged => Err(Calculation::Unchanged),
        }
    }
}

/// Consumption that is newer than the last calculation.
#[derive(Debug)]
pub struct Stale {
    /// Sorted by the interval end.
    pub consumption: Vec<Consumption>,

    /// End of the last consumption interval, the next `last_calculated_at`.
    pub calculated_at: DateTime<Utc>,
}

/// Check whether the consumption has anything new since `last_calculated_at`.
pub fn check_staleness(
    consumption: &[Consumption],
    last_calculated_at: Option<DateTime<Utc>>,
) -> Calculation<Stale> {
    let consumption = sort_consumption(consumption);
    let Some(last) = consumption.last() else {
        return Calculation::Pending;
    };
    let calculated_at = last.interval.end;
    if last_calculated_at.is_some_and(|last_calculated_at| last_calculated_at >= calculated_at) {
        return Calculation::Unchanged;
    }
    Calculation::Ready(Stale { consumption, calculated_at })
}
