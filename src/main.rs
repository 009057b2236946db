#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod cache;
mod cli;
mod core;
mod poll;
mod prelude;
mod quantity;
mod tables;

use chrono::Utc;
use clap::{Parser, crate_version};
use tokio::time::sleep;

use crate::{
    api::{Octopus, supplier::Supplier},
    cli::{Args, Command, PollArgs, RatesArgs, WatchArgs},
    core::{interval::Interval, meter::Meter, tariff::Fuel},
    poll::State,
    prelude::*,
    tables::{
        build_agreements_table,
        build_cost_table,
        build_meters_table,
        build_products_table,
        build_rates_table,
        build_usage_table,
    },
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let octopus = args.octopus.try_new_client()?;

    match args.command {
        Command::Account(args) => {
            let account = octopus
                .get_account(&args.account_number)
                .await?
                .context("the account is not available")?;
            println!("{}", build_meters_table(&account.meters(Utc::now())));
            println!("{}", build_agreements_table(&account));
        }
        Command::Products(args) => {
            let products = octopus.get_products(args.variable).await?;
            info!(n_products = products.len(), "fetched");
            println!("{}", build_products_table(&products));
        }
        Command::Rates(args) => {
            let period = args.period.billing_period(&octopus.timezone())?;
            rates(&octopus, &args, period).await?;
        }
        Command::Poll(args) => {
            let meters = args.meters.resolve(&octopus, Utc::now()).await?;
            poll(&octopus, &args, &meters).await?;
        }
        Command::Watch(args) => {
            watch(&octopus, &args).await?;
        }
    }

    info!("done!");
    Ok(())
}

#[instrument(skip_all, fields(tariff_code = %args.tariff_code))]
async fn rates(octopus: &Octopus, args: &RatesArgs, period: Interval) -> Result {
    let rates = async {
        match args.fuel {
            Fuel::Electricity => {
                octopus.get_electricity_rates(&args.tariff_code, args.smart_meter, period).await
            }
            Fuel::Gas => octopus.get_gas_rates(&args.tariff_code, period).await,
        }
    };
    let (rates, standing_charge) = tokio::try_join!(
        rates,
        octopus.get_standing_charge(args.fuel, &args.tariff_code, period),
    )?;
    let Some(rates) = rates else {
        warn!(?period, "no rates available");
        return Ok(());
    };
    println!("{}", build_rates_table(&rates, standing_charge));
    Ok(())
}

/// Run one polling cycle against the cached state and print the sensors.
async fn poll(octopus: &Octopus, args: &PollArgs, meters: &[Meter]) -> Result {
    let period = args.period.billing_period(&octopus.timezone())?;
    let mut state = State::read_from(&args.cache_path)?;
    state.poll(octopus, meters, Utc::now(), period).await;
    state.write_to(&args.cache_path)?;

    for meter in meters {
        let Some(meter_state) = state.meters.get(&meter.to_string()) else {
            continue;
        };
        if let Some(usage) = &meter_state.usage {
            info!(%meter, "usage");
            println!("{}", build_usage_table(usage));
        }
        if let Some(cost) = &meter_state.cost {
            info!(%meter, total = %cost.total, "cost");
            println!("{}", build_cost_table(cost));
        }
    }
    Ok(())
}

async fn watch(octopus: &Octopus, args: &WatchArgs) -> Result {
    let meters = args.poll.meters.resolve(octopus, Utc::now()).await?;
    info!(n_meters = meters.len(), polling_interval = ?args.polling_interval(), "watching…");
    loop {
        if let Err(error) = poll(octopus, &args.poll, &meters).await {
            error!("polling failed: {error:#}");
        }
        sleep(args.polling_interval()).await;
    }
}
