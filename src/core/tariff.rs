use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::core::error::InvalidTariffCode;

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Fuel {
    Electricity,
    Gas,
}

impl Fuel {
    /// Path segment of the tariff endpoints.
    #[must_use]
    pub const fn tariffs_segment(self) -> &'static str {
        match self {
            Self::Electricity => "electricity-tariffs",
            Self::Gas => "gas-tariffs",
        }
    }

    /// Path segment of the consumption endpoints.
    #[must_use]
    pub const fn meter_points_segment(self) -> &'static str {
        match self {
            Self::Electricity => "electricity-meter-points",
            Self::Gas => "gas-meter-points",
        }
    }
}

/// Full tariff code, for example `E-1R-AGILE-18-02-21-C`.
#[derive(Clone, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TariffCode {
    code: String,

    /// Byte range of the rate indicator in [`TariffCode::code`].
    rate: (usize, usize),

    /// Byte range of the product code in [`TariffCode::code`].
    product: (usize, usize),
}

impl TariffCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Fuel letter: `E` or `G`.
    #[must_use]
    pub fn fuel_indicator(&self) -> &str {
        &self.code[..self.rate.0 - 1]
    }

    /// Rate indicator, for example `1R` or `2R`.
    #[must_use]
    pub fn rate_indicator(&self) -> &str {
        &self.code[self.rate.0..self.rate.1]
    }

    /// Product code, for example `AGILE-18-02-21`.
    #[must_use]
    pub fn product_code(&self) -> &str {
        &self.code[self.product.0..self.product.1]
    }

    /// Region letter, for example `C` for London.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.code[self.product.1 + 1..]
    }

    /// Whether it's a single-rate tariff, as opposed to a day/night one.
    #[must_use]
    pub fn is_single_rate(&self) -> bool {
        self.rate_indicator().starts_with('1')
    }
}

impl FromStr for TariffCode {
    type Err = InvalidTariffCode;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTariffCode(code.to_string());
        let (fuel, rest) = code.split_once('-').ok_or_else(invalid)?;
        let (rate, rest) = rest.split_once('-').ok_or_else(invalid)?;
        let (product, region) = rest.rsplit_once('-').ok_or_else(invalid)?;
        if fuel.is_empty() || rate.is_empty() || product.is_empty() || region.is_empty() {
            return Err(invalid());
        }
        let rate_start = fuel.len() + 1;
        let product_start = rate_start + rate.len() + 1;
        Ok(Self {
            code: code.to_string(),
            rate: (rate_start, rate_start + rate.len()),
            product: (product_start, product_start + product.len()),
        })
    }
}

impl TryFrom<String> for TariffCode {
    type Error = InvalidTariffCode;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<TariffCode> for String {
    fn from(tariff_code: TariffCode) -> Self {
        tariff_code.code
    }
}

impl Display for TariffCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

impl Debug for TariffCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.code)
    }
}
