//! Engine registry.
//!
//! Engines are looked up by key at call time, so the valuation orchestrator
//! can reach comps and market prediction without depending on them directly.
//! The registry is built once at startup and shared read-only afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::comps::{CompsEngine, ProviderChain};
use crate::config::EngineConfig;
use crate::prediction::MarketPredictionEngine;
use crate::valuation::ValuationEngine;

pub const COMPS: &str = "comps";
pub const MARKET_PREDICTION: &str = "market_prediction";
pub const VALUATION: &str = "valuation";

/// A named computation over an untyped JSON request.
///
/// Engines never panic or return `Err` across this boundary; failures are
/// reported inside the returned value (`{"status": "error", ...}`).
pub trait Engine: Send + Sync {
    fn run(&self, params: &Value, registry: &EngineRegistry) -> Value;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    pub key: String,
    pub name: String,
    pub description: String,
}

struct EngineEntry {
    info: EngineInfo,
    engine: Arc<dyn Engine>,
}

#[derive(Default)]
pub struct EngineRegistry {
    entries: BTreeMap<String, EngineEntry>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comps, market prediction and valuation, wired from `config`.
    pub fn standard(config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        registry.register(
            COMPS,
            "Comparable Sales",
            "Comps engine with filtering, adjustments, weighting, outlier control and quality metrics. CSV-backed with synthetic fallback.",
            CompsEngine::new(ProviderChain::standard(config.comps_csv.as_deref())),
        );
        registry.register(
            MARKET_PREDICTION,
            "Market Prediction",
            "Short-horizon token price drift from a linear model artifact, with a heuristic fallback.",
            MarketPredictionEngine::new(config.model_path.clone(), config.seed),
        );
        registry.register(
            VALUATION,
            "Valuation",
            "Equity and credit valuation with comps blend, overlays, DCF/IRR, Monte Carlo banding and token pricing.",
            ValuationEngine::new(config.clone()),
        );
        registry
    }

    /// Register `engine` under `key`, replacing any previous entry.
    pub fn register(
        &mut self,
        key: &str,
        name: &str,
        description: &str,
        engine: impl Engine + 'static,
    ) {
        let info = EngineInfo {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        };
        self.entries.insert(
            key.to_string(),
            EngineEntry {
                info,
                engine: Arc::new(engine),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Engine>> {
        self.entries.get(key).map(|e| Arc::clone(&e.engine))
    }

    /// Registered engines, sorted by key.
    pub fn list(&self) -> Vec<EngineInfo> {
        self.entries.values().map(|e| e.info.clone()).collect()
    }

    /// Run the engine under `key`, or `None` if nothing is registered there.
    pub fn run(&self, key: &str, params: &Value) -> Option<Value> {
        let engine = self.get(key)?;
        Some(engine.run(params, self))
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Drop `null` members from a JSON object so serde defaults apply to them.
pub fn without_nulls(params: &Value) -> Value {
    match params {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}
