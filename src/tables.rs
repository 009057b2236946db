use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    api::octopus::{account::Account, models::Product},
    core::{
        billing::CostSummary,
        meter::Meter,
        rate::{Rate, StandingCharge},
        tariff::Fuel,
    },
    poll::Usage,
    quantity::rate::KilowattHourRate,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

pub fn build_rates_table(rates: &[Rate], standing_charge: Option<StandingCharge>) -> Table {
    let median_rate = rates
        .iter()
        .map(|rate| rate.value_inc_vat)
        .sorted_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0))
        .nth(rates.len() / 2)
        .unwrap_or(KilowattHourRate::ZERO);

    let mut table = new_table();
    table.set_header(vec!["Date", "Start", "End", "Exc. VAT", "Inc. VAT"]);
    for rate in rates {
        table.add_row(vec![
            Cell::new(rate.interval.start.format("%Y-%m-%d")).add_attribute(Attribute::Dim),
            Cell::new(rate.interval.start.format("%H:%M")),
            Cell::new(rate.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(rate.value_exc_vat).set_alignment(CellAlignment::Right),
            Cell::new(rate.value_inc_vat).set_alignment(CellAlignment::Right).fg(
                if rate.value_inc_vat > median_rate { Color::Red } else { Color::Green },
            ),
        ]);
    }
    if let Some(standing_charge) = standing_charge {
        table.add_row(vec![
            Cell::new("Standing charge").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(standing_charge.value_exc_vat).set_alignment(CellAlignment::Right),
            Cell::new(standing_charge.value_inc_vat).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_cost_table(cost: &CostSummary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Start", "End", "Rate", "Consumption", "Cost"]);
    for charge in &cost.charges {
        table.add_row(vec![
            Cell::new(charge.interval.start.format("%H:%M")),
            Cell::new(charge.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(charge.rate).set_alignment(CellAlignment::Right),
            Cell::new(charge.consumption).set_alignment(CellAlignment::Right),
            Cell::new(charge.cost.to_pounds()).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Standing charge").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(cost.standing_charge.to_pounds()).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(cost.total_without_standing_charge).set_alignment(CellAlignment::Right),
        Cell::new(cost.total).set_alignment(CellAlignment::Right).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_usage_table(usage: &Usage) -> Table {
    let mut table = new_table();
    match usage {
        Usage::Electricity(usage) => {
            table.set_header(vec!["Start", "End", "Consumption"]);
            for item in &usage.consumptions {
                table.add_row(vec![
                    Cell::new(item.interval.start.format("%H:%M")),
                    Cell::new(item.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
                    Cell::new(item.consumption).set_alignment(CellAlignment::Right),
                ]);
            }
            table.add_row(vec![
                Cell::new("Total").add_attribute(Attribute::Bold),
                Cell::new(""),
                Cell::new(usage.total).set_alignment(CellAlignment::Right),
            ]);
        }
        Usage::Gas(usage) => {
            table.set_header(vec!["Start", "End", "Volume", "Energy"]);
            for item in &usage.consumptions {
                table.add_row(vec![
                    Cell::new(item.interval.start.format("%H:%M")),
                    Cell::new(item.interval.end.format("%H:%M")).add_attribute(Attribute::Dim),
                    Cell::new(item.consumption_m3).set_alignment(CellAlignment::Right),
                    Cell::new(item.consumption_kwh).set_alignment(CellAlignment::Right),
                ]);
            }
            table.add_row(vec![
                Cell::new("Total").add_attribute(Attribute::Bold),
                Cell::new(""),
                Cell::new(usage.total_m3).set_alignment(CellAlignment::Right),
                Cell::new(usage.total_kwh).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}

pub fn build_meters_table(meters: &[Meter]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Fuel", "Point", "Serial number", "Tariff", "Fuel/region", "Smart"]);
    for meter in meters {
        table.add_row(vec![
            Cell::new(match meter.fuel {
                Fuel::Electricity => "electricity",
                Fuel::Gas => "gas",
            })
            .fg(match meter.fuel {
                Fuel::Electricity => Color::Yellow,
                Fuel::Gas => Color::Blue,
            }),
            Cell::new(&meter.point),
            Cell::new(&meter.serial_number),
            Cell::new(&meter.tariff_code).fg(if meter.tariff_code.is_single_rate() {
                Color::Reset
            } else {
                Color::Magenta
            }),
            Cell::new(format!("{}/{}", meter.tariff_code.fuel_indicator(), meter.tariff_code.region())),
            Cell::new(if meter.is_smart_meter { "yes" } else { "" }),
        ]);
    }
    table
}

/// Static tariff details from the account, when queried.
pub fn build_agreements_table(account: &Account) -> Table {
    let electricity = account
        .electricity_meter_points
        .iter()
        .flat_map(|point| point.agreements.iter().map(move |agreement| (&point.mpan, agreement)));
    let gas = account
        .gas_meter_points
        .iter()
        .flat_map(|point| point.agreements.iter().map(move |agreement| (&point.mprn, agreement)));

    let mut table = new_table();
    table.set_header(vec![
        "Point",
        "Valid from",
        "Valid to",
        "Tariff",
        "Standing",
        "Unit",
        "Day",
        "Night",
        "Off-peak",
    ]);
    for (point, agreement) in electricity.chain(gas) {
        let tariff = &agreement.tariff;
        let optional = |value: Option<KilowattHourRate>| {
            Cell::new(value.map(|value| value.to_string()).unwrap_or_default())
                .set_alignment(CellAlignment::Right)
        };
        table.add_row(vec![
            Cell::new(point),
            Cell::new(agreement.valid_from.format("%Y-%m-%d")),
            Cell::new(
                agreement
                    .valid_to
                    .map(|valid_to| valid_to.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(tariff.tariff_code.as_ref().map(ToString::to_string).unwrap_or_default()),
            Cell::new(tariff.standing_charge.map(|value| value.to_string()).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
            optional(tariff.unit_rate),
            optional(tariff.day_rate),
            optional(tariff.night_rate),
            optional(tariff.off_peak_rate),
        ]);
    }
    table
}

pub fn build_products_table(products: &[Product]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Code",
        "Name",
        "Full name",
        "Direction",
        "Variable",
        "Green",
        "Available from",
        "Available to",
    ]);
    for product in products {
        table.add_row(vec![
            Cell::new(&product.code).add_attribute(Attribute::Bold),
            Cell::new(&product.display_name),
            Cell::new(&product.full_name).add_attribute(Attribute::Dim),
            Cell::new(product.direction.as_deref().unwrap_or_default()),
            Cell::new(if product.is_variable { "yes" } else { "" }),
            Cell::new(if product.is_green { "yes" } else { "" }).fg(Color::Green),
            Cell::new(
                product
                    .available_from
                    .map(|available_from| available_from.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(
                product
                    .available_to
                    .map(|available_to| available_to.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    table
}
