//! Bring the supplier's irregular records onto the half-hourly grid.

use chrono::TimeDelta;
use itertools::Itertools;

use crate::{
    core::{
        consumption::Consumption,
        interval::Interval,
        rate::{Rate, RawRate},
        tariff::TariffCode,
    },
    prelude::*,
};

/// Project the raw rates onto every half-hour of the period.
///
/// Returns exactly `period.duration() / 30min` ascending rates, or [`None`] when there's nothing
/// to project. A half-hour covered by no raw rate carries forward the last known rate.
#[instrument(skip_all, level = Level::DEBUG, fields(tariff_code = %tariff_code))]
pub fn to_half_hourly(
    raw_rates: &[RawRate],
    period: Interval,
    tariff_code: &TariffCode,
) -> Result<Option<Vec<Rate>>> {
    ensure!(
        period.duration() > TimeDelta::zero()
            && period.duration().num_seconds() % Interval::HALF_HOUR.num_seconds() == 0,
        "period {period:?} is not a whole number of half-hours",
    );
    if raw_rates.is_empty() {
        return Ok(None);
    }

    // Last rate that expired before the period, if any, seeds the carry-forward.
    let mut last_known = raw_rates
        .iter()
        .filter(|raw| raw.valid_to.is_some_and(|valid_to| valid_to <= period.start))
        .max_by_key(|raw| raw.valid_to)
        .copied();

    let projected = period
        .half_hours()
        .map(|slot| {
            let raw = raw_rates
                .iter()
                .filter(|raw| raw.covers(slot.start))
                .max_by_key(|raw| raw.valid_from)
                .copied();
            if raw.is_some() {
                last_known = raw;
            }
            (slot, last_known)
        })
        .collect_vec();

    let Some(first_known) = projected.iter().find_map(|(_, raw)| *raw) else {
        warn!(n_raw_rates = raw_rates.len(), "No raw rate covers the period");
        return Ok(None);
    };
    let rates = projected
        .into_iter()
        .map(|(interval, raw)| {
            let raw = raw.unwrap_or(first_known);
            Rate { interval, value_exc_vat: raw.value_exc_vat, value_inc_vat: raw.value_inc_vat }
        })
        .collect_vec();
    debug!(n_raw_rates = raw_rates.len(), n_rates = rates.len(), "Normalized");
    Ok(Some(rates))
}

/// Keep the consumption within the period, sorted by the interval end, without overlaps.
///
/// The supplier returns slightly more than requested. Gaps are left as they are.
#[must_use]
pub fn clip_consumption(consumption: Vec<Consumption>, period: Interval) -> Vec<Consumption> {
    let mut clipped: Vec<Consumption> = Vec::with_capacity(consumption.len());
    for item in consumption
        .into_iter()
        .filter(|item| item.interval.start >= period.start && item.interval.end <= period.end)
        .sorted_by_key(|item| item.interval.end)
    {
        if clipped.last().is_none_or(|last| !last.interval.overlaps(item.interval)) {
            clipped.push(item);
        } else {
            debug!(interval = ?item.interval, "Dropped overlapping consumption");
        }
    }
    clipped
}

/// Sort the consumption by the interval end.
#[must_use]
pub fn sort_consumption(consumption: &[Consumption]) -> Vec<Consumption> {
    consumption.iter().copied().sorted_by_key(|item| item.interval.end).collect()
}
