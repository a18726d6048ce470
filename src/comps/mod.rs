//! Comparable-sales search.

pub mod engine;
pub mod geo;
pub mod provider;

pub use engine::CompsEngine;
pub use provider::{CompsProvider, CsvProvider, ProviderChain, SyntheticProvider};
