//! Short-horizon market drift forecast for the token price overlay.
//!
//! A trained linear model is used when its artifact loads and predicts
//! cleanly; anything else falls back to the bounded heuristic.

pub mod features;
pub mod heuristic;
pub mod model;
pub mod trainer;

use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{ForecastDrivers, ForecastMode, MarketForecast};
use crate::error::ModelLoadError;
use crate::registry::{Engine, EngineRegistry};

pub use features::{FEATURE_NAMES, MarketSignals};
pub use model::{LinearModel, MarketModel};
pub use trainer::{TrainingSummary, train_from_csv};

#[derive(Debug, Clone)]
pub struct MarketPredictionEngine {
    model_path: PathBuf,
    seed: Option<u64>,
}

impl MarketPredictionEngine {
    pub fn new(model_path: PathBuf, seed: Option<u64>) -> Self {
        Self { model_path, seed }
    }

    pub fn forecast(&self, signals: &MarketSignals, seed: Option<u64>) -> MarketForecast {
        match self.model_forecast(signals) {
            Ok(forecast) => forecast,
            Err(ModelLoadError::Missing(path)) => {
                debug!(path = %path.display(), "no market model artifact; using heuristic");
                self.heuristic_forecast(signals, seed)
            }
            Err(e) => {
                warn!(error = %e, "market model unusable; using heuristic");
                self.heuristic_forecast(signals, seed)
            }
        }
    }

    fn model_forecast(&self, signals: &MarketSignals) -> Result<MarketForecast, ModelLoadError> {
        let model = MarketModel::load(&self.model_path)?;
        let x = signals.vector(&model.feats);
        let (f1w, f1m) = model.predict(&x)?;
        Ok(MarketForecast {
            status: "ok".to_string(),
            mode: ForecastMode::Ml,
            version: Some(model.version),
            forecast_1w: f1w,
            forecast_1m: f1m,
            drivers: ForecastDrivers::Model {
                model: "linear_least_squares".to_string(),
                features: model.feats,
            },
        })
    }

    fn heuristic_forecast(&self, signals: &MarketSignals, seed: Option<u64>) -> MarketForecast {
        let mut rng = match seed.or(self.seed) {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let (f1w, f1m, drivers) = heuristic::forecast(signals, &mut rng);
        MarketForecast {
            status: "ok".to_string(),
            mode: ForecastMode::Heuristic,
            version: None,
            forecast_1w: f1w,
            forecast_1m: f1m,
            drivers: ForecastDrivers::Heuristic(drivers),
        }
    }
}

impl Engine for MarketPredictionEngine {
    fn run(&self, params: &Value, _registry: &EngineRegistry) -> Value {
        let signals = MarketSignals::from_params(params);
        let seed = params.get("seed").and_then(Value::as_u64);
        serde_json::to_value(self.forecast(&signals, seed)).unwrap_or(Value::Null)
    }
}
