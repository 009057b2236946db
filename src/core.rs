pub mod billing;
pub mod calculation;
pub mod consumption;
pub mod error;
pub mod interval;
pub mod meter;
pub mod night;
pub mod normalize;
pub mod rate;
pub mod refresh;
pub mod tariff;
pub mod usage;
