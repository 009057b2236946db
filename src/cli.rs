use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use reqwest::Url;

use crate::{
    api::{Octopus, octopus::account::Account},
    core::{
        interval::Interval,
        meter::Meter,
        night::now_in,
        tariff::{Fuel, TariffCode},
    },
    poll::billing_period,
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[clap(flatten)]
    pub octopus: OctopusArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the account's meter points, meters, and tariff agreements.
    #[clap(name = "account")]
    Account(AccountArgs),

    /// List the supplier's products.
    #[clap(name = "products")]
    Products(ProductsArgs),

    /// Show the half-hourly rates and standing charge of a tariff.
    #[clap(name = "rates")]
    Rates(RatesArgs),

    /// Run one polling cycle and update the cache.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Keep polling until interrupted.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),
}

#[derive(Parser)]
pub struct OctopusArgs {
    #[clap(long = "api-key", env = "OCTOPUS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[clap(
        long = "api-base-url",
        env = "OCTOPUS_API_BASE_URL",
        default_value = Octopus::DEFAULT_BASE_URL,
    )]
    pub base_url: Url,

    /// Local timezone of the meters.
    #[clap(long, env = "TIMEZONE", default_value = "Europe/London")]
    pub timezone: Tz,

    /// Also query the static unit rates and standing charges with the account.
    #[clap(long, env = "OCTOPUS_STATIC_RATES")]
    pub static_rates: bool,
}

impl OctopusArgs {
    pub fn try_new_client(&self) -> Result<Octopus> {
        let api = Octopus::try_new(self.api_key.clone(), self.base_url.clone(), self.timezone)?;
        Ok(if self.static_rates { api.with_static_rates() } else { api })
    }
}

#[derive(Parser)]
pub struct AccountArgs {
    #[clap(long = "account-number", env = "OCTOPUS_ACCOUNT_NUMBER")]
    pub account_number: String,
}

#[derive(Parser)]
pub struct ProductsArgs {
    /// List only the variable products.
    #[clap(long)]
    pub variable: bool,
}

#[derive(Parser)]
pub struct RatesArgs {
    #[clap(long, value_enum, default_value = "electricity")]
    pub fuel: Fuel,

    /// For example, `E-1R-AGILE-18-02-21-C`.
    #[clap(long = "tariff-code")]
    pub tariff_code: TariffCode,

    /// Classify the day/night rates by the smart meter's night window.
    #[clap(long)]
    pub smart_meter: bool,

    #[clap(flatten)]
    pub period: PeriodArgs,
}

#[derive(Copy, Clone, Parser)]
pub struct PeriodArgs {
    /// Local day to bill, `1` is yesterday.
    #[clap(long = "days-ago", default_value = "1", env = "DAYS_AGO")]
    pub days_ago: u64,
}

impl PeriodArgs {
    pub fn billing_period(self, timezone: &Tz) -> Result<Interval> {
        billing_period(&now_in(timezone), self.days_ago)
    }
}

#[derive(Parser)]
pub struct PollArgs {
    #[clap(flatten)]
    pub meters: MeterArgs,

    #[clap(flatten)]
    pub period: PeriodArgs,

    #[clap(long = "cache-path", env = "CACHE_PATH", default_value = "octopus-meter.toml")]
    pub cache_path: PathBuf,
}

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(flatten)]
    pub poll: PollArgs,

    #[clap(long = "polling-interval-secs", default_value = "60", env = "POLLING_INTERVAL_SECS")]
    pub polling_interval_secs: u64,
}

impl WatchArgs {
    pub const fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }
}

/// Either discover the meters via the account, or specify them explicitly.
#[derive(Parser)]
pub struct MeterArgs {
    #[clap(long = "account-number", env = "OCTOPUS_ACCOUNT_NUMBER")]
    pub account_number: Option<String>,

    #[clap(long = "electricity-mpan", env = "ELECTRICITY_MPAN")]
    pub electricity_mpan: Option<String>,

    #[clap(long = "electricity-serial-number", env = "ELECTRICITY_SERIAL_NUMBER")]
    pub electricity_serial_number: Option<String>,

    #[clap(long = "electricity-tariff-code", env = "ELECTRICITY_TARIFF_CODE")]
    pub electricity_tariff_code: Option<TariffCode>,

    #[clap(long = "electricity-smart-meter", env = "ELECTRICITY_SMART_METER")]
    pub is_electricity_smart_meter: bool,

    #[clap(long = "gas-mprn", env = "GAS_MPRN")]
    pub gas_mprn: Option<String>,

    #[clap(long = "gas-serial-number", env = "GAS_SERIAL_NUMBER")]
    pub gas_serial_number: Option<String>,

    #[clap(long = "gas-tariff-code", env = "GAS_TARIFF_CODE")]
    pub gas_tariff_code: Option<TariffCode>,
}

impl MeterArgs {
    /// Explicitly configured meters.
    #[must_use]
    pub fn explicit_meters(&self) -> Vec<Meter> {
        let electricity = self
            .electricity_mpan
            .as_ref()
            .zip(self.electricity_serial_number.as_ref())
            .zip(self.electricity_tariff_code.as_ref())
            .map(|((mpan, serial_number), tariff_code)| {
                Meter::builder()
                    .fuel(Fuel::Electricity)
                    .point(mpan)
                    .serial_number(serial_number)
                    .tariff_code(tariff_code.clone())
                    .is_smart_meter(self.is_electricity_smart_meter)
                    .build()
            });
        let gas = self
            .gas_mprn
            .as_ref()
            .zip(self.gas_serial_number.as_ref())
            .zip(self.gas_tariff_code.as_ref())
            .map(|((mprn, serial_number), tariff_code)| {
                Meter::builder()
                    .fuel(Fuel::Gas)
                    .point(mprn)
                    .serial_number(serial_number)
                    .tariff_code(tariff_code.clone())
                    .build()
            });
        electricity.into_iter().chain(gas).collect()
    }

    /// Explicit meters take precedence over the discovered ones.
    pub async fn resolve(&self, octopus: &Octopus, now: DateTime<Utc>) -> Result<Vec<Meter>> {
        let meters = self.explicit_meters();
        if !meters.is_empty() {
            return Ok(meters);
        }
        let account_number =
            self.account_number.as_deref().context("neither meters nor account number are set")?;
        let account = octopus
            .get_account(account_number)
            .await?
            .with_context(|| format!("account `{account_number}` is not available"))?;
        Ok(account.meters(now).into_iter().filter(|meter| !is_export(&account, meter)).collect())
    }
}

/// Export meters are not billed.
fn is_export(account: &Account, meter: &Meter) -> bool {
    account
        .electricity_meter_points
        .iter()
        .filter(|point| point.mpan == meter.point)
        .flat_map(|point| &point.meters)
        .any(|candidate| candidate.serial_number == meter.serial_number && candidate.is_export)
}
