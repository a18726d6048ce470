//! Mathematical utilities: order statistics, discounting/IRR, and least squares.

pub mod cashflow;
pub mod ols;
pub mod stats;

pub use cashflow::*;
pub use ols::*;
pub use stats::*;
