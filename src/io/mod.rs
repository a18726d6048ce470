//! Input/output helpers.
//!
//! - JSON request files (`request`)
//! - persisted valuation records (`record`)
//! - comps CSV export (`export`)

pub mod export;
pub mod record;
pub mod request;

pub use export::*;
pub use record::*;
pub use request::*;
