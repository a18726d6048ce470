//! Persisted valuation snapshots.
//!
//! A record pairs the raw request with the full result plus the two headline
//! numbers a project dashboard needs without re-reading the result body.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Mode, ValuationResult};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRecord {
    pub project_id: String,
    pub mode: Mode,
    pub inputs: Value,
    pub result: ValuationResult,
    pub nav_per_token: f64,
    pub base_value: f64,
    pub created_at: DateTime<Utc>,
}

impl ValuationRecord {
    pub fn new(project_id: impl Into<String>, inputs: Value, result: ValuationResult) -> Self {
        Self {
            project_id: project_id.into(),
            mode: result.mode,
            inputs,
            nav_per_token: result.token_pricing.nav_per_token,
            base_value: result.core_valuation.base,
            result,
            created_at: Utc::now(),
        }
    }
}

pub fn write_record_json(path: &Path, record: &ValuationRecord) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create record directory '{}': {e}", parent.display()))
        })?;
    }
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| AppError::new(2, format!("Failed to serialize valuation record: {e}")))?;
    fs::write(path, json)
        .map_err(|e| AppError::new(2, format!("Failed to write record '{}': {e}", path.display())))?;
    Ok(())
}

pub fn read_record_json(path: &Path) -> Result<ValuationRecord, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read record '{}': {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::new(2, format!("Invalid record '{}': {e}", path.display())))
}
