//! Fit the linear market model from a CSV history.
//!
//! The CSV carries any subset of [`FEATURE_NAMES`] as columns plus the two
//! targets `fwd_1w` and `fwd_1m` (forward returns). Rows with a missing or
//! non-numeric value in a used column are skipped.

use std::collections::HashMap;
use std::path::Path;

use nalgebra::DVector;
use tracing::{debug, info};

use crate::error::TrainError;
use crate::math::ols::{design_with_intercept, solve_least_squares};
use crate::prediction::features::FEATURE_NAMES;
use crate::prediction::model::{LinearModel, MODEL_VERSION, MarketModel};

pub const TARGET_1W: &str = "fwd_1w";
pub const TARGET_1M: &str = "fwd_1m";

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub model: MarketModel,
    pub rows_read: usize,
    pub rows_used: usize,
}

pub fn train_from_csv(path: &Path) -> Result<TrainingSummary, TrainError> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    train_from_reader(reader)
}

pub fn train_from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<TrainingSummary, TrainError> {
    let headers = reader.headers()?.clone();
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase(), i))
        .collect();

    let feats: Vec<String> = FEATURE_NAMES
        .iter()
        .filter(|name| header_map.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if feats.is_empty() {
        return Err(TrainError::MissingColumn(FEATURE_NAMES.join("|")));
    }
    let target_idx = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| TrainError::MissingColumn(name.to_string()))
    };
    let y1_idx = target_idx(TARGET_1W)?;
    let y2_idx = target_idx(TARGET_1M)?;
    let feat_idx: Vec<usize> = feats.iter().filter_map(|f| header_map.get(f).copied()).collect();

    let mut rows = Vec::new();
    let mut y1 = Vec::new();
    let mut y2 = Vec::new();
    let mut rows_read = 0usize;

    for record in reader.records() {
        rows_read += 1;
        let Ok(record) = record else { continue };
        let num = |idx: usize| {
            record
                .get(idx)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let x: Option<Vec<f64>> = feat_idx.iter().map(|&i| num(i)).collect();
        let (Some(x), Some(a), Some(b)) = (x, num(y1_idx), num(y2_idx)) else {
            continue;
        };
        rows.push(x);
        y1.push(a);
        y2.push(b);
    }

    // Intercept plus one column per feature.
    if rows.len() <= feats.len() {
        return Err(TrainError::TooFewRows {
            rows: rows.len(),
            features: feats.len() + 1,
        });
    }
    debug!(rows_read, rows_used = rows.len(), features = feats.len(), "training market model");

    let design = design_with_intercept(&rows);
    let fit = |y: &[f64], label: &str| -> Result<LinearModel, TrainError> {
        let beta = solve_least_squares(&design, &DVector::from_column_slice(y))
            .ok_or_else(|| TrainError::Solve(label.to_string()))?;
        Ok(LinearModel {
            intercept: beta[0],
            coef: beta.iter().skip(1).copied().collect(),
        })
    };
    let m1 = fit(&y1, TARGET_1W)?;
    let m2 = fit(&y2, TARGET_1M)?;

    info!(rows_used = rows.len(), "market model trained");
    Ok(TrainingSummary {
        model: MarketModel {
            version: MODEL_VERSION.to_string(),
            feats,
            m1,
            m2,
        },
        rows_read,
        rows_used: rows.len(),
    })
}
