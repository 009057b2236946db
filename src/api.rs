pub mod client;
pub mod octopus;
pub mod supplier;

pub use self::octopus::Api as Octopus;
