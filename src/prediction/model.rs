//! Linear market model artifact.
//!
//! Stored as JSON:
//!
//! ```json
//! {"version": "lin_v1", "feats": ["watchlist_count", ...],
//!  "m1": {"intercept": 0.0, "coef": [...]},
//!  "m2": {"intercept": 0.0, "coef": [...]}}
//! ```
//!
//! `m1` predicts 1-week drift and `m2` 1-month drift.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::ModelLoadError;

pub const MODEL_VERSION: &str = "lin_v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coef: Vec<f64>,
}

impl LinearModel {
    pub fn predict(&self, x: &[f64]) -> Result<f64, ModelLoadError> {
        if x.len() != self.coef.len() {
            return Err(ModelLoadError::Invalid(format!(
                "expected {} features, got {}",
                self.coef.len(),
                x.len()
            )));
        }
        let beta = DVector::from_column_slice(&self.coef);
        let x = DVector::from_column_slice(x);
        let y = self.intercept + beta.dot(&x);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(ModelLoadError::Invalid("non-finite prediction".to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketModel {
    #[serde(default = "default_version")]
    pub version: String,
    pub feats: Vec<String>,
    pub m1: LinearModel,
    pub m2: LinearModel,
}

fn default_version() -> String {
    MODEL_VERSION.to_string()
}

impl MarketModel {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let raw = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ModelLoadError::Missing(path.to_path_buf())
            } else {
                ModelLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let model: MarketModel =
            serde_json::from_str(&raw).map_err(|e| ModelLoadError::Invalid(e.to_string()))?;
        model.check()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    fn check(&self) -> Result<(), ModelLoadError> {
        for (label, m) in [("m1", &self.m1), ("m2", &self.m2)] {
            if m.coef.len() != self.feats.len() {
                return Err(ModelLoadError::Invalid(format!(
                    "{label} has {} coefficients for {} features",
                    m.coef.len(),
                    self.feats.len()
                )));
            }
        }
        Ok(())
    }

    /// `(forecast_1w, forecast_1m)` for one feature vector.
    pub fn predict(&self, x: &[f64]) -> Result<(f64, f64), ModelLoadError> {
        Ok((self.m1.predict(x)?, self.m2.predict(x)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> MarketModel {
        MarketModel {
            version: MODEL_VERSION.to_string(),
            feats: vec!["a".to_string(), "b".to_string()],
            m1: LinearModel { intercept: 0.001, coef: vec![0.5, -0.25] },
            m2: LinearModel { intercept: 0.0, coef: vec![1.0, 0.0] },
        }
    }

    #[test]
    fn predicts_intercept_plus_dot() {
        let (w, m) = model().predict(&[0.02, 0.04]).unwrap();
        assert!((w - (0.001 + 0.01 - 0.01)).abs() < 1e-12);
        assert!((m - 0.02).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(model().predict(&[1.0]).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        model().save(&path).unwrap();
        assert_eq!(MarketModel::load(&path).unwrap(), model());
    }

    #[test]
    fn load_reports_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(MarketModel::load(&missing), Err(ModelLoadError::Missing(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"feats": ["a"], "m1": {"intercept": 0, "coef": []}, "m2": {"intercept": 0, "coef": [1]}}"#).unwrap();
        assert!(matches!(MarketModel::load(&bad), Err(ModelLoadError::Invalid(_))));
    }
}
