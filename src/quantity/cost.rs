use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::quantity::{Quantity, round_to};

/// Cost in the minor currency unit.
pub type Pence = Quantity<0, 0, 1>;

impl Pence {
    /// Convert to pounds, rounded to whole pence.
    #[must_use]
    pub fn to_pounds(self) -> Pounds {
        Pounds(round_to(self.0 / 100.0, 2))
    }
}

impl Display for Pence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}p", self.0)
    }
}

impl Debug for Pence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}p", self.0)
    }
}

/// Rounded output amount in pounds sterling.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Serialize, Deserialize, derive_more::From)]
#[serde(transparent)]
pub struct Pounds(pub f64);

impl Display for Pounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "£{:.2}", self.0)
    }
}

impl Debug for Pounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "£{:.2}", self.0)
    }
}
