//! Consumption costs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::supplier::Supplier,
    core::{
        calculation::{Calculation, Stale, check_staleness},
        consumption::Consumption,
        error::MissingRateError,
        interval::Interval,
        meter::Meter,
        rate::{Rate, StandingCharge},
        tariff::{Fuel, TariffCode},
    },
    prelude::*,
    quantity::{
        cost::{Pence, Pounds},
        energy::KilowattHours,
        rate::KilowattHourRate,
        volume::CubicMetres,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub interval: Interval,

    /// Unit rate including VAT.
    pub rate: KilowattHourRate,

    pub consumption: KilowattHours,
    pub cost: Pence,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// Daily standing charge including VAT.
    pub standing_charge: Pence,

    pub total_without_standing_charge: Pounds,
    pub total: Pounds,
    pub last_calculated_at: DateTime<Utc>,
    pub charges: Vec<Charge>,
}

/// Calculate the electricity cost, unless nothing changed since `last_calculated_at`.
pub async fn calculate_electricity_cost(
    supplier: &dyn Supplier,
    meter: &Meter,
    consumption: &[Consumption],
    last_calculated_at: Option<DateTime<Utc>>,
    period: Interval,
) -> Result<Calculation<CostSummary>> {
    ensure!(meter.fuel == Fuel::Electricity, "`{meter}` is not an electricity meter");
    calculate_cost(supplier, meter, consumption, last_calculated_at, period, KilowattHours::from)
        .await
}

/// Calculate the gas cost, converting the metered cubic metres into kilowatt-hours first.
pub async fn calculate_gas_cost(
    supplier: &dyn Supplier,
    meter: &Meter,
    consumption: &[Consumption],
    last_calculated_at: Option<DateTime<Utc>>,
    period: Interval,
) -> Result<Calculation<CostSummary>> {
    ensure!(meter.fuel == Fuel::Gas, "`{meter}` is not a gas meter");
    calculate_cost(supplier, meter, consumption, last_calculated_at, period, |reading| {
        CubicMetres::from(reading).to_kilowatt_hours()
    })
    .await
}

#[instrument(
    skip_all,
    fields(meter = %meter, tariff_code = %meter.tariff_code, n_intervals = consumption.len()),
)]
async fn calculate_cost(
    supplier: &dyn Supplier,
    meter: &Meter,
    consumption: &[Consumption],
    last_calculated_at: Option<DateTime<Utc>>,
    period: Interval,
    to_kilowatt_hours: impl Fn(f64) -> KilowattHours,
) -> Result<Calculation<CostSummary>> {
    let Stale { consumption, calculated_at } =
        match check_staleness(consumption, last_calculated_at).branch() {
            Ok(stale) => stale,
            Err(outcome) => return Ok(outcome),
        };

    let (rates, standing_charge) = tokio::try_join!(
        supplier.get_rates(meter, period),
        supplier.get_standing_charge(meter.fuel, &meter.tariff_code, period),
    )?;
    let (Some(rates), Some(standing_charge)) = (rates, standing_charge) else {
        info!("Rates or standing charge are not available yet");
        return Ok(Calculation::Pending);
    };
    if rates.is_empty() {
        info!("No rates yet");
        return Ok(Calculation::Pending);
    }

    let summary = bill(
        &consumption,
        &rates,
        standing_charge,
        &meter.tariff_code,
        to_kilowatt_hours,
        calculated_at,
    )?;
    info!(total = %summary.total, "Calculated");
    Ok(Calculation::Ready(summary))
}

/// Price every consumption interval with the exactly matching rate.
///
/// Totals are rounded only here, the per-interval costs are kept as is.
pub fn bill(
    consumption: &[Consumption],
    rates: &[Rate],
    standing_charge: StandingCharge,
    tariff_code: &TariffCode,
    to_kilowatt_hours: impl Fn(f64) -> KilowattHours,
    calculated_at: DateTime<Utc>,
) -> Result<CostSummary, MissingRateError> {
    let rates: HashMap<Interval, &Rate> = rates.iter().map(|rate| (rate.interval, rate)).collect();
    let charges = consumption
        .iter()
        .map(|item| {
            let rate = rates.get(&item.interval).ok_or_else(|| MissingRateError {
                interval: item.interval,
                tariff_code: tariff_code.clone(),
            })?;
            let consumption = to_kilowatt_hours(item.value);
            Ok(Charge {
                interval: rate.interval,
                rate: rate.value_inc_vat,
                consumption,
                cost: consumption * rate.value_inc_vat,
            })
        })
        .collect::<Result<Vec<_>, MissingRateError>>()?;
    let total_cost: Pence = charges.iter().map(|charge| charge.cost).sum();
    Ok(CostSummary {
        standing_charge: standing_charge.value_inc_vat,
        total_without_standing_charge: total_cost.to_pounds(),
        total: (total_cost + standing_charge.value_inc_vat).to_pounds(),
        last_calculated_at: calculated_at,
        charges,
    })
}
