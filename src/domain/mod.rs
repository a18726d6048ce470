//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - request shapes (`ValuationParams` and the validated `ValuationRequest` union)
//! - comparable-sales records (`ComparableSale`, `AdjustedComp`, `CompsResponse`)
//! - result shapes (`ValuationResult`, `ValuationResponse`, `MarketForecast`)

pub mod comps;
pub mod result;
pub mod types;

pub use comps::*;
pub use result::*;
pub use types::*;
