use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::{
    core::{consumption::Consumption, interval::Interval, rate::StandingCharge},
    quantity::cost::Pence,
};

/// Paginated REST response.
#[derive(Deserialize)]
pub struct Page<T> {
    /// URL of the next page.
    #[serde(default)]
    pub next: Option<String>,

    pub results: Vec<T>,
}

#[serde_as]
#[derive(Deserialize)]
pub struct RawConsumption {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub consumption: f64,

    pub interval_start: DateTime<Utc>,
    pub interval_end: DateTime<Utc>,
}

impl From<RawConsumption> for Consumption {
    fn from(raw: RawConsumption) -> Self {
        Self::new(Interval::new(raw.interval_start, raw.interval_end), raw.consumption)
    }
}

#[serde_as]
#[derive(Deserialize)]
pub struct RawStandingCharge {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub value_exc_vat: f64,

    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub value_inc_vat: f64,
}

impl From<RawStandingCharge> for StandingCharge {
    fn from(raw: RawStandingCharge) -> Self {
        Self {
            value_exc_vat: Pence::from(raw.value_exc_vat),
            value_inc_vat: Pence::from(raw.value_inc_vat),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Product {
    pub code: String,

    #[serde(default)]
    pub direction: Option<String>,

    pub full_name: String,
    pub display_name: String,

    #[serde(default)]
    pub is_variable: bool,

    #[serde(default)]
    pub is_green: bool,

    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,

    #[serde(default)]
    pub available_to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{core::rate::RawRate, prelude::*, quantity::rate::KilowattHourRate};

    #[test]
    fn test_deserialize_rates_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "count": 2,
                "next": null,
                "previous": null,
                "results": [
                    {
                        "value_exc_vat": 3.99,
                        "value_inc_vat": 4.1895,
                        "valid_from": "2021-12-01T00:00:00Z",
                        "valid_to": null,
                        "payment_method": null
                    },
                    {
                        "value_exc_vat": 3.5,
                        "value_inc_vat": 3.675,
                        "valid_from": "2021-07-30T23:00:00Z",
                        "valid_to": "2021-12-01T00:00:00Z",
                        "payment_method": null
                    }
                ]
            }
        "#;
        let page = serde_json::from_str::<Page<RawRate>>(RESPONSE)?;
        assert!(page.next.is_none());
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].value_inc_vat, KilowattHourRate::from(4.1895));
        assert!(page.results[0].valid_to.is_none());
        assert_eq!(
            page.results[1].valid_from,
            Some(Utc.with_ymd_and_hms(2021, 7, 30, 23, 0, 0).unwrap()),
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_rate_without_value_fails() {
        // language=JSON
        const RESPONSE: &str = r#"{"results": [{"valid_from": "2021-12-01T00:00:00Z"}]}"#;
        assert!(serde_json::from_str::<Page<RawRate>>(RESPONSE).is_err());
    }

    #[test]
    fn test_deserialize_consumption_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {
                "count": 1,
                "next": "https://api.octopus.energy/v1/electricity-meter-points/1/meters/2/consumption/?page=2",
                "results": [
                    {
                        "consumption": "0.123",
                        "interval_start": "2022-06-01T00:30:00+01:00",
                        "interval_end": "2022-06-01T01:00:00+01:00"
                    }
                ]
            }
        "#;
        let page = serde_json::from_str::<Page<RawConsumption>>(RESPONSE)?;
        assert!(page.next.is_some());
        let consumption = page.results.into_iter().map(Consumption::from).next().unwrap();
        assert_eq!(consumption.value, 0.123);
        assert_eq!(consumption.interval.start, Utc.with_ymd_and_hms(2022, 5, 31, 23, 30, 0).unwrap());
        Ok(())
    }

    #[test]
    fn test_deserialize_standing_charge_ok() -> Result {
        // language=JSON
        const RESPONSE: &str = r#"
            {"results": [{"value_exc_vat": 23.85, "value_inc_vat": 25.0425, "valid_from": "2021-07-30T23:00:00Z", "valid_to": null}]}
        "#;
        let page = serde_json::from_str::<Page<RawStandingCharge>>(RESPONSE)?;
        let standing_charge = StandingCharge::from(page.results.into_iter().next().unwrap());
        assert_eq!(standing_charge.value_inc_vat, Pence::from(25.0425));
        Ok(())
    }
}
