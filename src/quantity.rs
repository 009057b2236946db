pub mod cost;
pub mod energy;
pub mod rate;
pub mod volume;

use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

/// Physical quantity tagged with its dimensions: energy (kWh), gas volume (m³) and cost (pence).
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
#[serde(transparent)]
pub struct Quantity<const ENERGY: isize, const VOLUME: isize, const COST: isize>(pub f64);

impl<const ENERGY: isize, const VOLUME: isize, const COST: isize> Quantity<ENERGY, VOLUME, COST> {
    pub const ZERO: Self = Self(0.0);

    /// Round to the specified number of decimal places.
    #[must_use]
    pub fn round_to(self, digits: i32) -> Self {
        Self(round_to(self.0, digits))
    }
}

impl<const ENERGY: isize, const VOLUME: isize, const COST: isize> Mul<f64>
    for Quantity<ENERGY, VOLUME, COST>
{
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl<const ENERGY: isize, const VOLUME: isize, const COST: isize> Div<f64>
    for Quantity<ENERGY, VOLUME, COST>
{
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

/// Round to `digits` decimal places, ties to even.
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10.0_f64.powi(digits);
    (value * factor).round_ties_even() / factor
}
