//! Market signals read from a valuation request.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::{ClimateSignals, Liquidity, MacroOverlay, MarketDemand};
use crate::registry::without_nulls;

/// Feature names understood by the linear model, in canonical order.
pub const FEATURE_NAMES: [&str; 9] = [
    "watchlist_count",
    "bids_24h",
    "active_users_24h",
    "external_index",
    "spread_bps",
    "depth_units",
    "turnover_24h_pct",
    "enso_rain_anom_pct",
    "rate_10y_bp",
];

/// The overlay blocks of a valuation request that drive the forecast.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MarketSignals {
    pub demand: Option<MarketDemand>,
    pub liquidity: Option<Liquidity>,
    pub climate_signals: Option<ClimateSignals>,
    #[serde(rename = "macro")]
    pub macro_overlay: Option<MacroOverlay>,
}

impl MarketSignals {
    /// Lenient read: a block with the wrong shape is treated as absent.
    pub fn from_params(params: &Value) -> Self {
        let params = without_nulls(params);
        let block = |key: &str| params.get(key).cloned().map(|v| without_nulls(&v));

        let mut signals = MarketSignals::default();
        if let Some(v) = block("demand") {
            signals.demand = serde_json::from_value(v).ok();
        }
        if let Some(v) = block("liquidity") {
            signals.liquidity = serde_json::from_value(v).ok();
        }
        if let Some(v) = block("climate_signals") {
            signals.climate_signals = serde_json::from_value(v).ok();
        }
        if let Some(v) = block("macro") {
            signals.macro_overlay = serde_json::from_value(v).ok();
        }
        debug!(?signals, "market signals");
        signals
    }

    /// Value of a named feature with neutral defaults; unknown names are 0.
    pub fn feature(&self, name: &str) -> f64 {
        let demand = self.demand.clone().unwrap_or_default();
        let liq = self.liquidity.clone().unwrap_or_default();
        let value = match name {
            "watchlist_count" => demand.watchlist_count,
            "bids_24h" => demand.bids_24h,
            "active_users_24h" => demand.active_users_24h,
            "external_index" => demand.external_index,
            "spread_bps" => liq.spread_bps,
            "depth_units" => liq.depth_units,
            "turnover_24h_pct" => liq.turnover_24h_pct,
            "enso_rain_anom_pct" => self
                .climate_signals
                .as_ref()
                .map(|c| c.rain_anom_pct)
                .unwrap_or(0.0),
            "rate_10y_bp" => self
                .macro_overlay
                .as_ref()
                .and_then(|m| m.rate_10y_bp)
                .unwrap_or(0.0),
            _ => 0.0,
        };
        if value.is_finite() { value } else { 0.0 }
    }

    /// Feature vector in the order given by `names`.
    pub fn vector(&self, names: &[String]) -> Vec<f64> {
        names.iter().map(|n| self.feature(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let s = MarketSignals::from_params(&serde_json::json!({}));
        assert_eq!(s.feature("external_index"), 1.0);
        assert_eq!(s.feature("spread_bps"), 120.0);
        assert_eq!(s.feature("rate_10y_bp"), 0.0);
        assert_eq!(s.feature("no_such_feature"), 0.0);
    }

    #[test]
    fn reads_blocks_and_orders_vector() {
        let s = MarketSignals::from_params(&serde_json::json!({
            "demand": {"watchlist_count": 250, "bids_24h": null},
            "liquidity": "garbage",
            "macro": {"rate_10y_bp": 420.0},
        }));
        let names = vec!["rate_10y_bp".to_string(), "watchlist_count".to_string()];
        assert_eq!(s.vector(&names), vec![420.0, 250.0]);
        assert!(s.liquidity.is_none());
    }
}
