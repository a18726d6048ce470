//! Shared command pipelines.
//!
//! Each function does the work behind one subcommand and returns plain data;
//! `app` only decides how to print it.

use serde_json::Value;
use tracing::{info, warn};

use crate::cli::{CompsArgs, PredictArgs, TrainArgs, ValueArgs};
use crate::comps::{CompsEngine, ProviderChain};
use crate::config::EngineConfig;
use crate::data::FredClient;
use crate::domain::{CompsQuery, CompsResponse, MarketForecast};
use crate::error::AppError;
use crate::io::{fill_rate_10y, read_request_json};
use crate::prediction::{MarketPredictionEngine, MarketSignals, TrainingSummary, train_from_csv};
use crate::registry::EngineRegistry;
use crate::valuation::{ValuationEngine, ValuationOutcome};

/// All computed outputs of a single `rev value` run.
#[derive(Debug, Clone)]
pub struct ValueRun {
    /// The request as evaluated (after any live-rate fill).
    pub request: Value,
    pub outcome: ValuationOutcome,
}

pub fn run_value(args: &ValueArgs, config: &EngineConfig) -> Result<ValueRun, AppError> {
    let mut request = read_request_json(&args.input)?;
    if args.live_rates {
        apply_live_rate(&mut request);
    }

    let registry = EngineRegistry::standard(config);
    let outcome = ValuationEngine::new(config.clone()).evaluate(&request, &registry);
    Ok(ValueRun { request, outcome })
}

/// Live rates are best effort: any failure leaves the request untouched.
fn apply_live_rate(request: &mut Value) {
    match FredClient::from_env().and_then(|c| c.latest_10y()) {
        Ok(obs) => {
            if fill_rate_10y(request, obs.rate_bp) {
                info!(date = %obs.date, rate_bp = obs.rate_bp, "filled 10y rate from FRED");
            }
        }
        Err(e) => warn!(error = %e, "live 10y rate unavailable"),
    }
}

pub fn run_comps(args: &CompsArgs, config: &EngineConfig) -> CompsResponse {
    let engine = CompsEngine::new(ProviderChain::standard(config.comps_csv.as_deref()));
    engine.search(&CompsQuery {
        address: args.address.clone(),
        radius_miles: args.radius_miles,
        limit: args.limit,
        subject_sqft: args.sqft,
        subject_beds: args.beds,
        subject_baths: args.baths,
    })
}

pub fn run_predict(args: &PredictArgs, config: &EngineConfig) -> Result<MarketForecast, AppError> {
    let request = read_request_json(&args.input)?;
    let engine = MarketPredictionEngine::new(config.model_path.clone(), config.seed);
    let seed = request.get("seed").and_then(Value::as_u64);
    Ok(engine.forecast(&MarketSignals::from_params(&request), seed))
}

pub fn run_train(args: &TrainArgs, config: &EngineConfig) -> Result<TrainingSummary, AppError> {
    let summary = train_from_csv(&args.csv)?;
    let out = args.out.as_ref().unwrap_or(&config.model_path);
    summary.model.save(out).map_err(|e| {
        AppError::new(2, format!("Failed to write model artifact '{}': {e}", out.display()))
    })?;
    info!(
        path = %out.display(),
        rows_used = summary.rows_used,
        features = summary.model.feats.len(),
        "model artifact written"
    );
    Ok(summary)
}
