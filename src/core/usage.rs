//! Consumption totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        calculation::{Calculation, Stale, check_staleness},
        consumption::Consumption,
        interval::Interval,
    },
    prelude::*,
    quantity::{energy::KilowattHours, volume::CubicMetres},
};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectricityUsage {
    pub interval: Interval,
    pub consumption: KilowattHours,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectricityConsumption {
    pub total: KilowattHours,
    pub last_calculated_at: DateTime<Utc>,
    pub consumptions: Vec<ElectricityUsage>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasUsage {
    pub interval: Interval,
    pub consumption_m3: CubicMetres,
    pub consumption_kwh: KilowattHours,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GasConsumption {
    /// Rounded to litres.
    pub total_m3: CubicMetres,

    /// Rounded to watt-hours.
    pub total_kwh: KilowattHours,

    pub last_calculated_at: DateTime<Utc>,
    pub consumptions: Vec<GasUsage>,
}

/// Sum up the electricity consumption, unless nothing changed since `last_calculated_at`.
#[instrument(skip_all, level = Level::DEBUG, fields(n_intervals = consumption.len()))]
pub fn calculate_electricity_consumption(
    consumption: &[Consumption],
    last_calculated_at: Option<DateTime<Utc>>,
) -> Calculation<ElectricityConsumption> {
    let Stale { consumption, calculated_at } =
        match check_staleness(consumption, last_calculated_at).branch() {
            Ok(stale) => stale,
            Err(outcome) => return outcome,
        };
    let consumptions = consumption
        .into_iter()
        .map(|item| ElectricityUsage {
            interval: item.interval,
            consumption: KilowattHours::from(item.value),
        })
        .collect::<Vec<_>>();
    let total: KilowattHours = consumptions.iter().map(|usage| usage.consumption).sum();
    debug!(?total, %calculated_at, "Calculated");
    Calculation::Ready(ElectricityConsumption {
        total,
        last_calculated_at: calculated_at,
        consumptions,
    })
}

/// Sum up the gas consumption in both cubic metres and kilowatt-hours.
#[instrument(skip_all, level = Level::DEBUG, fields(n_intervals = consumption.len()))]
pub fn calculate_gas_consumption(
    consumption: &[Consumption],
    last_calculated_at: Option<DateTime<Utc>>,
) -> Calculation<GasConsumption> {
    let Stale { consumption, calculated_at } =
        match check_staleness(consumption, last_calculated_at).branch() {
            Ok(stale) => stale,
            Err(outcome) => return outcome,
        };
    let consumptions = consumption
        .into_iter()
        .map(|item| {
            let consumption_m3 = CubicMetres::from(item.value);
            GasUsage {
                interval: item.interval,
                consumption_m3,
                consumption_kwh: consumption_m3.to_kilowatt_hours(),
            }
        })
        .collect::<Vec<_>>();
    let total_m3: CubicMetres = consumptions.iter().map(|usage| usage.consumption_m3).sum();
    let total_kwh: KilowattHours = consumptions.iter().map(|usage| usage.consumption_kwh).sum();
    debug!(?total_m3, ?total_kwh, %calculated_at, "Calculated");
    Calculation::Ready(GasConsumption {
        total_m3: total_m3.round_to(3),
        total_kwh: total_kwh.round_to(3),
        last_calculated_at: calculated_at,
        consumptions,
    })
}
