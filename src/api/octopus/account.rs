//! Kraken GraphQL: authentication and the account's meter points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::IgnoredAny};

use crate::{
    core::{
        meter::Meter,
        tariff::{Fuel, TariffCode},
    },
    prelude::*,
    quantity::{cost::Pence, rate::KilowattHourRate},
};

pub const OBTAIN_TOKEN_QUERY: &str =
    "mutation ObtainKrakenToken($apiKey: String!) { obtainKrakenToken(input: { APIKey: $apiKey }) { token } }";

pub const ACCOUNT_QUERY: &str = "query Account($accountNumber: String!) {
  account(accountNumber: $accountNumber) {
    electricityAgreements(active: true) {
      meterPoint {
        mpan
        meters(includeInactive: false) {
          serialNumber
          smartExportElectricityMeter { deviceId }
          smartImportElectricityMeter { deviceId }
        }
        agreements {
          validFrom
          validTo
          tariff {
            ...on StandardTariff { tariffCode }
            ...on DayNightTariff { tariffCode }
            ...on ThreeRateTariff { tariffCode }
            ...on HalfHourlyTariff { tariffCode }
            ...on PrepayTariff { tariffCode }
          }
        }
      }
    }
    gasAgreements(active: true) {
      meterPoint {
        mprn
        meters(includeInactive: false) { serialNumber }
        agreements { validFrom validTo tariff { tariffCode } }
      }
    }
  }
}";

/// Same as [`ACCOUNT_QUERY`] but with the tariffs' static unit rates and standing charges.
pub const STATIC_RATES_ACCOUNT_QUERY: &str = "query Account($accountNumber: String!) {
  account(accountNumber: $accountNumber) {
    electricityAgreements(active: true) {
      meterPoint {
        mpan
        meters(includeInactive: false) {
          serialNumber
          smartExportElectricityMeter { deviceId }
          smartImportElectricityMeter { deviceId }
        }
        agreements {
          validFrom
          validTo
          tariff {
            ...on TariffType { standingCharge productCode }
            ...on StandardTariff { tariffCode unitRate }
            ...on DayNightTariff { tariffCode dayRate nightRate }
            ...on ThreeRateTariff { tariffCode dayRate nightRate offPeakRate }
            ...on PrepayTariff { tariffCode unitRate }
          }
        }
      }
    }
    gasAgreements(active: true) {
      meterPoint {
        mprn
        meters(includeInactive: false) { serialNumber }
        agreements { validFrom validTo tariff { tariffCode productCode unitRate standingCharge } }
      }
    }
  }
}";

#[derive(Serialize)]
pub struct Request<V> {
    pub query: &'static str,
    pub variables: V,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObtainTokenVariables<'a> {
    pub api_key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountVariables<'a> {
    pub account_number: &'a str,
}

#[derive(Deserialize)]
pub struct Response<T> {
    pub data: Option<T>,

    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

impl<T> Response<T> {
    /// Log the errors, if any, and take the data.
    pub fn into_data(self) -> Option<T> {
        for error in &self.errors {
            error!(message = %error.message, "GraphQL error");
        }
        self.data
    }
}

#[derive(Deserialize)]
pub struct ResponseError {
    pub message: String,
}

#[derive(Deserialize)]
pub struct ObtainTokenData {
    #[serde(rename = "obtainKrakenToken")]
    pub obtain_kraken_token: Token,
}

#[derive(Deserialize)]
pub struct Token {
    pub token: String,
}

#[derive(Deserialize)]
pub struct AccountData {
    pub account: RawAccount,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    electricity_agreements: Vec<ElectricityAgreement>,
    gas_agreements: Vec<GasAgreement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElectricityAgreement {
    meter_point: RawElectricityMeterPoint,
}

#[derive(Deserialize)]
struct RawElectricityMeterPoint {
    mpan: String,
    meters: Vec<RawElectricityMeter>,
    agreements: Vec<Agreement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawElectricityMeter {
    serial_number: String,
    smart_export_electricity_meter: Option<IgnoredAny>,
    smart_import_electricity_meter: Option<IgnoredAny>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasAgreement {
    meter_point: RawGasMeterPoint,
}

#[derive(Deserialize)]
struct RawGasMeterPoint {
    mprn: String,
    meters: Vec<GasMeter>,
    agreements: Vec<Agreement>,
}

#[derive(Clone, Debug, Default)]
pub struct Account {
    pub electricity_meter_points: Vec<ElectricityMeterPoint>,
    pub gas_meter_points: Vec<GasMeterPoint>,
}

#[derive(Clone, Debug)]
pub struct ElectricityMeterPoint {
    pub mpan: String,
    pub meters: Vec<ElectricityMeter>,
    pub agreements: Vec<Agreement>,
}

#[derive(Clone, Debug)]
pub struct ElectricityMeter {
    pub serial_number: String,
    pub is_export: bool,
    pub is_smart_meter: bool,
}

#[derive(Clone, Debug)]
pub struct GasMeterPoint {
    pub mprn: String,
    pub meters: Vec<GasMeter>,
    pub agreements: Vec<Agreement>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasMeter {
    pub serial_number: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tariff: Tariff,
}

impl Agreement {
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && self.valid_to.is_none_or(|valid_to| now < valid_to)
    }
}

/// Tariff fields, all of them depend on the tariff type and the query.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tariff {
    pub tariff_code: Option<TariffCode>,
    pub standing_charge: Option<Pence>,
    pub unit_rate: Option<KilowattHourRate>,
    pub day_rate: Option<KilowattHourRate>,
    pub night_rate: Option<KilowattHourRate>,
    pub off_peak_rate: Option<KilowattHourRate>,
}

/// Tariff code of the agreement active at the moment.
#[must_use]
pub fn active_tariff_code(agreements: &[Agreement], now: DateTime<Utc>) -> Option<&TariffCode> {
    agreements
        .iter()
        .filter(|agreement| agreement.is_active_at(now))
        .find_map(|agreement| agreement.tariff.tariff_code.as_ref())
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        Self {
            electricity_meter_points: raw
                .electricity_agreements
                .into_iter()
                .map(|agreement| {
                    let meter_point = agreement.meter_point;
                    ElectricityMeterPoint {
                        mpan: meter_point.mpan,
                        meters: meter_point
                            .meters
                            .into_iter()
                            .map(|meter| ElectricityMeter {
                                serial_number: meter.serial_number,
                                is_export: meter.smart_export_electricity_meter.is_some(),
                                is_smart_meter: meter.smart_import_electricity_meter.is_some()
                                    || meter.smart_export_electricity_meter.is_some(),
                            })
                            .collect(),
                        agreements: meter_point.agreements,
                    }
                })
                .collect(),
            gas_meter_points: raw
                .gas_agreements
                .into_iter()
                .map(|agreement| GasMeterPoint {
                    mprn: agreement.meter_point.mprn,
                    meters: agreement.meter_point.meters,
                    agreements: agreement.meter_point.agreements,
                })
                .collect(),
        }
    }
}

impl Account {
    /// Meters billed on an active tariff at the moment.
    #[must_use]
    pub fn meters(&self, now: DateTime<Utc>) -> Vec<Meter> {
        let electricity = self.electricity_meter_points.iter().flat_map(|point| {
            let tariff_code = active_tariff_code(&point.agreements, now);
            if tariff_code.is_none() {
                warn!(mpan = %point.mpan, "No active tariff");
            }
            point.meters.iter().filter_map(move |meter| {
                Some(
                    Meter::builder()
                        .fuel(Fuel::Electricity)
                        .point(&point.mpan)
                        .serial_number(&meter.serial_number)
                        .tariff_code(tariff_code?.clone())
                        .is_smart_meter(meter.is_smart_meter)
                        .build(),
                )
            })
        });
        let gas = self.gas_meter_points.iter().flat_map(|point| {
            let tariff_code = active_tariff_code(&point.agreements, now);
            if tariff_code.is_none() {
                warn!(mprn = %point.mprn, "No active tariff");
            }
            point.meters.iter().filter_map(move |meter| {
                Some(
                    Meter::builder()
                        .fuel(Fuel::Gas)
                        .point(&point.mprn)
                        .serial_number(&meter.serial_number)
                        .tariff_code(tariff_code?.clone())
                        .build(),
                )
            })
        });
        electricity.chain(gas).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    // language=JSON
    const RESPONSE: &str = r#"
        {
            "data": {
                "account": {
                    "electricityAgreements": [
                        {
                            "meterPoint": {
                                "mpan": "1100000000000",
                                "meters": [
                                    {
                                        "serialNumber": "21L1",
                                        "smartExportElectricityMeter": null,
                                        "smartImportElectricityMeter": {"deviceId": "00-00"}
                                    }
                                ],
                                "agreements": [
                                    {
                                        "validFrom": "2021-01-01T00:00:00+00:00",
                                        "validTo": "2022-01-01T00:00:00+00:00",
                                        "tariff": {"tariffCode": "E-1R-VAR-20-09-22-C"}
                                    },
                                    {
                                        "validFrom": "2022-01-01T00:00:00+00:00",
                                        "validTo": null,
                                        "tariff": {"tariffCode": "E-2R-VAR-21-09-29-C", "dayRate": 30.1, "nightRate": 15.2}
                                    }
                                ]
                            }
                        }
                    ],
                    "gasAgreements": [
                        {
                            "meterPoint": {
                                "mprn": "1234567890",
                                "meters": [{"serialNumber": "E6S1"}],
                                "agreements": [
                                    {
                                        "validFrom": "2021-01-01T00:00:00+00:00",
                                        "validTo": null,
                                        "tariff": {"tariffCode": "G-1R-VAR-21-09-29-C"}
                                    }
                                ]
                            }
                        }
                    ]
                }
            }
        }
    "#;

    #[test]
    fn test_deserialize_account_ok() -> Result {
        let account = Account::from(
            serde_json::from_str::<Response<AccountData>>(RESPONSE)?
                .into_data()
                .context("no data")?
                .account,
        );
        assert_eq!(account.electricity_meter_points.len(), 1);
        let meter = &account.electricity_meter_points[0].meters[0];
        assert!(meter.is_smart_meter);
        assert!(!meter.is_export);
        let agreement = &account.electricity_meter_points[0].agreements[1];
        assert_eq!(agreement.tariff.night_rate, Some(KilowattHourRate::from(15.2)));
        assert_eq!(account.gas_meter_points[0].meters[0].serial_number, "E6S1");
        Ok(())
    }

    #[test]
    fn test_meters_use_active_tariff() -> Result {
        let account = Account::from(
            serde_json::from_str::<Response<AccountData>>(RESPONSE)?
                .into_data()
                .context("no data")?
                .account,
        );
        let now = Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap();
        let meters = account.meters(now);
        assert_eq!(meters.len(), 2);
        assert_eq!(meters[0].tariff_code.as_str(), "E-2R-VAR-21-09-29-C");
        assert!(meters[0].is_smart_meter);
        assert_eq!(meters[1].fuel, Fuel::Gas);

        let before = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        assert!(account.meters(before).is_empty());
        Ok(())
    }

    #[test]
    fn test_deserialize_errors() -> Result {
        // language=JSON
        const RESPONSE: &str =
            r#"{"data": null, "errors": [{"message": "Invalid data.", "path": ["obtainKrakenToken"]}]}"#;
        let response = serde_json::from_str::<Response<ObtainTokenData>>(RESPONSE)?;
        assert_eq!(response.errors.len(), 1);
        assert!(response.into_data().is_none());
        Ok(())
    }
}
