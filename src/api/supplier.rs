use async_trait::async_trait;

use crate::{
    core::{
        consumption::Consumption,
        interval::Interval,
        meter::Meter,
        rate::{Rate, StandingCharge},
        tariff::{Fuel, TariffCode},
    },
    prelude::*,
};

/// Remote data the sensors are calculated from.
///
/// [`None`] means the data is not available (yet), while [`Err`] is a transport failure.
#[async_trait]
pub trait Supplier: Sync {
    /// Half-hourly electricity rates over the period, day/night tariffs already combined.
    async fn get_electricity_rates(
        &self,
        tariff_code: &TariffCode,
        is_smart_meter: bool,
        period: Interval,
    ) -> Result<Option<Vec<Rate>>>;

    /// Half-hourly gas rates over the period.
    async fn get_gas_rates(
        &self,
        tariff_code: &TariffCode,
        period: Interval,
    ) -> Result<Option<Vec<Rate>>>;

    async fn get_standing_charge(
        &self,
        fuel: Fuel,
        tariff_code: &TariffCode,
        period: Interval,
    ) -> Result<Option<StandingCharge>>;

    /// Consumption within the period, sorted by the interval end.
    async fn get_consumption(
        &self,
        meter: &Meter,
        period: Interval,
    ) -> Result<Option<Vec<Consumption>>>;

    /// Rates the meter is billed at.
    async fn get_rates(&self, meter: &Meter, period: Interval) -> Result<Option<Vec<Rate>>> {
        match meter.fuel {
            Fuel::Electricity => {
                self.get_electricity_rates(&meter.tariff_code, meter.is_smart_meter, period).await
            }
            Fuel::Gas => self.get_gas_rates(&meter.tariff_code, period).await,
        }
    }
}
