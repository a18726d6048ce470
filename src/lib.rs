//! `re-valuation` library crate.
//!
//! The binary (`rev`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - engines are reusable behind other front-ends (HTTP, workers)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod comps;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod prediction;
pub mod registry;
pub mod report;
pub mod valuation;
