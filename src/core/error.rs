use crate::core::{interval::Interval, tariff::TariffCode};

/// Consumption interval without the matching rate.
///
/// Means that the supplier returned misaligned rates and consumption, never expected normally.
#[derive(Debug, thiserror::Error)]
#[error("failed to find rate for consumption between {interval} for tariff {tariff_code}")]
pub struct MissingRateError {
    pub interval: Interval,
    pub tariff_code: TariffCode,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid tariff code `{0}`: expected `<fuel>-<rate>-<product>-<region>`")]
pub struct InvalidTariffCode(pub String);
