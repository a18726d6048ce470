//! External market data.

pub mod fred;

pub use fred::{FredClient, RateObservation};
