//! Equity and credit valuation.
//!
//! [`ValuationEngine`] validates a request, runs the mode-specific pipeline
//! and assembles a [`crate::domain::ValuationResult`]. The submodules hold
//! the pure pricing math it composes.

pub mod credit;
pub mod dcf;
pub mod engine;
pub mod hedonic;
pub mod monte_carlo;
pub mod overlays;
pub mod residual;
pub mod summary;
pub mod token;
pub mod validate;

pub use engine::{ValuationEngine, ValuationOutcome, run};
pub use validate::parse_request;
