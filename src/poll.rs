//! Host-side polling cycle: what the sensors would do on every update.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    api::supplier::Supplier,
    core::{
        billing::{CostSummary, calculate_electricity_cost, calculate_gas_cost},
        calculation::Calculation,
        consumption::Consumption,
        interval::Interval,
        meter::Meter,
        refresh::refresh_consumption,
        tariff::Fuel,
        usage::{
            ElectricityConsumption,
            GasConsumption,
            calculate_electricity_consumption,
            calculate_gas_consumption,
        },
    },
    prelude::*,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "fuel", rename_all = "snake_case")]
pub enum Usage {
    Electricity(ElectricityConsumption),
    Gas(GasConsumption),
}

impl Usage {
    #[must_use]
    pub const fn last_calculated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Electricity(usage) => usage.last_calculated_at,
            Self::Gas(usage) => usage.last_calculated_at,
        }
    }
}

/// Everything remembered about a meter between the cycles.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeterState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Interval>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<Vec<Consumption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostSummary>,
}

/// Polling state of all the meters, keyed by the meter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub meters: BTreeMap<String, MeterState>,
}

impl State {
    /// Run one polling cycle over all the meters.
    ///
    /// A failing meter is logged and keeps its previous state.
    #[instrument(skip_all, fields(n_meters = meters.len(), period = ?period))]
    pub async fn poll(
        &mut self,
        supplier: &dyn Supplier,
        meters: &[Meter],
        now: DateTime<Utc>,
        period: Interval,
    ) {
        for meter in meters {
            let state = self.meters.entry(meter.to_string()).or_default();
            if let Err(error) = state.poll(supplier, meter, now, period).await {
                error!(%meter, "Failed to update: {error:#}");
            }
        }
    }
}

impl MeterState {
    #[instrument(skip_all, fields(meter = %meter))]
    pub async fn poll(
        &mut self,
        supplier: &dyn Supplier,
        meter: &Meter,
        now: DateTime<Utc>,
        period: Interval,
    ) -> Result {
        if self.period != Some(period) {
            info!(?period, "New billing period");
            *self = Self { period: Some(period), ..Self::default() };
        }

        let consumption =
            refresh_consumption(supplier, meter, self.consumption.clone(), now, period).await?;
        let consumption = &*self.consumption.insert(consumption);

        let usage_calculated_at = self.usage.as_ref().map(Usage::last_calculated_at);
        let usage = match meter.fuel {
            Fuel::Electricity => {
                calculate_electricity_consumption(consumption, usage_calculated_at)
                    .map(Usage::Electricity)
            }
            Fuel::Gas => {
                calculate_gas_consumption(consumption, usage_calculated_at).map(Usage::Gas)
            }
        };
        log_outcome("usage", &usage);
        if let Some(usage) = usage.ready() {
            self.usage = Some(usage);
        }

        let cost_calculated_at = self.cost.as_ref().map(|cost| cost.last_calculated_at);
        let cost = match meter.fuel {
            Fuel::Electricity => {
                calculate_electricity_cost(supplier, meter, consumption, cost_calculated_at, period)
                    .await?
            }
            Fuel::Gas => {
                calculate_gas_cost(supplier, meter, consumption, cost_calculated_at, period).await?
            }
        };
        log_outcome("cost", &cost);
        if let Some(cost) = cost.ready() {
            self.cost = Some(cost);
        }
        Ok(())
    }
}

fn log_outcome<T>(sensor: &str, calculation: &Calculation<T>) {
    match calculation {
        Calculation::Pending => debug!(sensor, "Not enough data yet"),
        Calculation::Unchanged => debug!(sensor, "Unchanged"),
        Calculation::Ready(_) => info!(sensor, "Updated"),
    }
}

/// Local day `days_ago` days before today.
///
/// The supplier publishes the consumption with a delay, so yesterday is normally the latest
/// complete day.
pub fn billing_period<Tz: TimeZone>(now: &DateTime<Tz>, days_ago: u64) -> Result<Interval> {
    let today = now.date_naive();
    let start = today.checked_sub_days(Days::new(days_ago)).context("date out of range")?;
    let end = start.checked_add_days(Days::new(1)).context("date out of range")?;
    let timezone = now.timezone();
    Ok(Interval::new(local_midnight(&timezone, start)?, local_midnight(&timezone, end)?))
}

fn local_midnight<Tz: TimeZone>(timezone: &Tz, date: chrono::NaiveDate) -> Result<DateTime<Utc>> {
    timezone
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|midnight| midnight.with_timezone(&Utc))
        .with_context(|| format!("no midnight on {date}"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeDelta;
    use chrono_tz::Europe::London;

    use super::*;
    use crate::{
        core::{
            rate::{Rate, StandingCharge},
            tariff::TariffCode,
        },
        quantity::{cost::Pence, rate::KilowattHourRate},
    };

    /// Publishes one more half-hour of consumption on every call.
    struct Trickle {
        n_published: AtomicUsize,
        n_rate_requests: AtomicUsize,
    }

    #[async_trait]
    impl Supplier for Trickle {
        async fn get_electricity_rates(
            &self,
            _tariff_code: &TariffCode,
            _is_smart_meter: bool,
            period: Interval,
        ) -> Result<Option<Vec<Rate>>> {
            self.n_rate_requests.fetch_add(1, Ordering::Relaxed);
            Ok(Some(
                period
                    .half_hours()
                    .map(|interval| Rate {
                        interval,
                        value_exc_vat: KilowattHourRate::from(20.0),
                        value_inc_vat: KilowattHourRate::from(21.0),
                    })
                    .collect(),
            ))
        }

        async fn get_gas_rates(
            &self,
            _tariff_code: &TariffCode,
            _period: Interval,
        ) -> Result<Option<Vec<Rate>>> {
            bail!("gas is not supplied")
        }

        async fn get_standing_charge(
            &self,
            _fuel: Fuel,
            _tariff_code: &TariffCode,
            _period: Interval,
        ) -> Result<Option<StandingCharge>> {
            Ok(Some(StandingCharge {
                value_exc_vat: Pence::from(40.0),
                value_inc_vat: Pence::from(42.0),
            }))
        }

        async fn get_consumption(
            &self,
            _meter: &Meter,
            period: Interval,
        ) -> Result<Option<Vec<Consumption>>> {
            let n_published = self.n_published.fetch_add(1, Ordering::Relaxed) + 1;
            Ok(Some(
                period
                    .half_hours()
                    .take(n_published)
                    .map(|interval| Consumption::new(interval, 1.0))
                    .collect(),
            ))
        }
    }

    fn period() -> Interval {
        let start = Utc.with_ymd_and_hms(2022, 1, 10, 0, 0, 0).unwrap();
        Interval::new(start, start + TimeDelta::days(1))
    }

    fn electricity_meter() -> Meter {
        Meter::builder()
            .fuel(Fuel::Electricity)
            .point("1100000000000")
            .serial_number("21L1")
            .tariff_code("E-1R-AGILE-18-02-21-C".parse().unwrap())
            .build()
    }

    fn gas_meter() -> Meter {
        Meter::builder()
            .fuel(Fuel::Gas)
            .point("1234567890")
            .serial_number("E6S1")
            .tariff_code("G-1R-VAR-21-09-29-C".parse().unwrap())
            .build()
    }

    #[tokio::test]
    async fn test_poll_trickling_data() {
        let supplier = Trickle { n_published: AtomicUsize::new(0), n_rate_requests: AtomicUsize::new(0) };
        let meter = electricity_meter();
        let mut state = State::default();
        let on_half_hour = Utc.with_ymd_and_hms(2022, 1, 11, 9, 0, 0).unwrap();
        let off_half_hour = on_half_hour + TimeDelta::minutes(7);

        state.poll(&supplier, &[meter.clone()], on_half_hour, period()).await;
        let cost = state.meters[&meter.to_string()].cost.clone().unwrap();
        assert_eq!(cost.charges.len(), 1);
        assert_eq!(supplier.n_rate_requests.load(Ordering::Relaxed), 1);

        // Nothing is refetched off the half-hour, so nothing is recalculated.
        state.poll(&supplier, &[meter.clone()], off_half_hour, period()).await;
        assert_eq!(supplier.n_rate_requests.load(Ordering::Relaxed), 1);

        state.poll(&supplier, &[meter.clone()], on_half_hour, period()).await;
        let meter_state = &state.meters[&meter.to_string()];
        let cost = meter_state.cost.as_ref().unwrap();
        assert_eq!(cost.charges.len(), 2);
        assert_eq!(cost.standing_charge, Pence::from(42.0));
        assert_eq!(supplier.n_rate_requests.load(Ordering::Relaxed), 2);
        let Some(Usage::Electricity(usage)) = &meter_state.usage else {
            panic!("expected electricity usage");
        };
        assert_eq!(usage.consumptions.len(), 2);
        assert_eq!(usage.last_calculated_at, cost.last_calculated_at);
    }

    #[tokio::test]
    async fn test_failing_meter_does_not_stop_others() {
        let supplier = Trickle { n_published: AtomicUsize::new(0), n_rate_requests: AtomicUsize::new(0) };
        let meters = [gas_meter(), electricity_meter()];
        let mut state = State::default();
        let now = Utc.with_ymd_and_hms(2022, 1, 11, 9, 30, 0).unwrap();
        state.poll(&supplier, &meters, now, period()).await;

        let gas_state = &state.meters[&meters[0].to_string()];
        assert!(gas_state.cost.is_none());
        assert!(matches!(gas_state.usage, Some(Usage::Gas(_))));
        assert!(state.meters[&meters[1].to_string()].cost.is_some());
    }

    #[tokio::test]
    async fn test_new_period_resets_state() {
        let supplier = Trickle { n_published: AtomicUsize::new(0), n_rate_requests: AtomicUsize::new(0) };
        let meter = electricity_meter();
        let mut meter_state = MeterState::default();
        let now = Utc.with_ymd_and_hms(2022, 1, 11, 9, 30, 0).unwrap();
        meter_state.poll(&supplier, &meter, now, period()).await.unwrap();

        let next_period = Interval::new(period().end, period().end + TimeDelta::days(1));
        meter_state.poll(&supplier, &meter, now + TimeDelta::days(1), next_period).await.unwrap();
        assert_eq!(meter_state.period, Some(next_period));
        let cost = meter_state.cost.unwrap();
        assert!(cost.charges.iter().all(|charge| charge.interval.start >= next_period.start));
    }

    #[test]
    fn test_billing_period() -> Result {
        let now = London.with_ymd_and_hms(2022, 6, 10, 12, 0, 0).unwrap();
        let period = billing_period(&now, 1)?;
        assert_eq!(period.start, Utc.with_ymd_and_hms(2022, 6, 8, 23, 0, 0).unwrap());
        assert_eq!(period.duration(), TimeDelta::days(1));
        Ok(())
    }

    #[test]
    fn test_billing_period_across_clock_change() -> Result {
        let now = London.with_ymd_and_hms(2022, 3, 28, 12, 0, 0).unwrap();
        let period = billing_period(&now, 1)?;
        assert_eq!(period.duration(), TimeDelta::hours(23));
        assert_eq!(period.half_hours().count(), 46);
        Ok(())
    }

    #[test]
    fn test_billing_period_days_ago() -> Result {
        let now = London.with_ymd_and_hms(2022, 11, 3, 8, 0, 0).unwrap();
        let period = billing_period(&now, 3)?;
        assert_eq!(period.start, Utc.with_ymd_and_hms(2022, 10, 31, 0, 0, 0).unwrap());
        assert_eq!(period.end, Utc.with_ymd_and_hms(2022, 11, 1, 0, 0, 0).unwrap());
        Ok(())
    }
}
