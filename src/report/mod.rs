//! Reporting utilities: formatted terminal output for valuations, comps,
//! forecasts and the engine catalogue.

pub mod format;

pub use format::*;
