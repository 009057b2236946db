use chrono::{DateTime, Timelike, Utc};

use crate::{
    api::supplier::Supplier,
    core::{consumption::Consumption, interval::Interval, meter::Meter, normalize::sort_consumption},
    prelude::*,
};

/// Refetch the consumption if it's missing, or incomplete and we're on a half-hour boundary.
///
/// The supplier publishes consumption in batches, so polling it every minute is pointless.
#[instrument(skip_all, fields(meter = %meter))]
pub async fn refresh_consumption(
    supplier: &dyn Supplier,
    meter: &Meter,
    previous: Option<Vec<Consumption>>,
    now: DateTime<Utc>,
    period: Interval,
) -> Result<Vec<Consumption>> {
    let should_fetch = previous.as_ref().is_none_or(|previous| {
        let is_incomplete = previous.last().is_none_or(|last| last.interval.end < period.end);
        is_incomplete && now.minute() % 30 == 0
    });
    if should_fetch {
        info!("Fetching…");
        if let Some(consumption) = supplier.get_consumption(meter, period).await?
            && !consumption.is_empty()
        {
            info!(n_intervals = consumption.len(), "Fetched");
            return Ok(sort_consumption(&consumption));
        }
    }
    Ok(previous.unwrap_or_default())
}
