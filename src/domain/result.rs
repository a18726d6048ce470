//! Result-side domain types.
//!
//! Everything here is plain data (numbers, strings, vectors) so a result can
//! be serialized straight into a persistence record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::comps::AdjustedComp;
use crate::domain::types::{Covenants, Mode, SpendCurve, ValidationIssue};

/// Low/base/high value band (p10/p50/p90).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub base: f64,
    pub high: f64,
}

impl Band {
    pub fn flat(value: f64) -> Self {
        Self {
            low: value,
            base: value,
            high: value,
        }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            low: f(self.low),
            base: f(self.base),
            high: f(self.high),
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.low <= self.base && self.base <= self.high
    }
}

/// Whether an optional value source contributed, and if not, why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Used,
    NotRequested,
    /// The source is not wired into this registry or has nothing to offer.
    Unavailable { reason: String },
    /// The source was called and its answer could not be used.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub hedonic: Option<f64>,
    pub residual_land_value: Option<f64>,
    pub comps_value: Option<f64>,
    pub comps_used: Vec<AdjustedComp>,
    pub comps_source: SourceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayDiagnostics {
    pub progress_discount: f64,
    pub delay_months: f64,
    pub delay_penalty: f64,
    pub macro_delta_bps: f64,
    pub liquidity_premium: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CovenantHeadroom {
    pub to_max_ltv: Option<f64>,
    pub to_min_dscr: Option<f64>,
    pub to_min_icr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantCheck {
    pub covenants: Covenants,
    pub breaches: Vec<String>,
    pub headroom: CovenantHeadroom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditMetrics {
    pub ltv: Option<f64>,
    pub ltc: Option<f64>,
    pub dscr: Option<f64>,
    pub icr: Option<f64>,
    pub debt_service_annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralReport {
    pub value: Option<f64>,
    #[serde(flatten)]
    pub metrics: CreditMetrics,
    pub covenant_check: CovenantCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nav {
    pub nav_equity: f64,
    pub nav_per_token: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenEconomics {
    pub tokens_outstanding: u64,
    #[serde(flatten)]
    pub nav: Nav,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    Ml,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicDrivers {
    pub demand_k: f64,
    pub liq_k: f64,
    pub weather: f64,
    pub rates: f64,
    pub noise: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForecastDrivers {
    Heuristic(HeuristicDrivers),
    Model { model: String, features: Vec<String> },
}

/// Wire shape of the market prediction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketForecast {
    pub status: String,
    pub mode: ForecastMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub forecast_1w: f64,
    pub forecast_1m: f64,
    pub drivers: ForecastDrivers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOverlay {
    Forecast(MarketForecast),
    Unavailable { status: String },
}

impl PredictionOverlay {
    pub fn none() -> Self {
        PredictionOverlay::Unavailable {
            status: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPricing {
    pub nav_per_token: f64,
    pub market_price_per_token: f64,
    pub demand_index: f64,
    pub prediction_overlay: PredictionOverlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMeta {
    pub risk_score: u8,
    pub band_spread_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualCashflow {
    pub year: usize,
    pub cf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub timeline_months: usize,
    pub spend_curve: SpendCurve,
    pub presale_pct: f64,
    pub presale_deposit_pct: f64,
    pub discount_rate_equity: f64,
    pub exit_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityDcf {
    pub cashflows_monthly: Vec<f64>,
    pub cashflows_annual: Vec<AnnualCashflow>,
    /// `None` when the cashflows have no sign change to solve for.
    pub irr_annual: Option<f64>,
    pub npv: f64,
    pub equity_multiple: Option<f64>,
    pub assumptions: DcfAssumptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditReturns {
    pub irr: Option<f64>,
    pub npv: Option<f64>,
    pub apy: Option<f64>,
    pub cashflows_annual: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedReturns {
    Equity { equity_dcf: EquityDcf },
    Credit(CreditReturns),
}

/// Term-sheet hint derived from the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperOffer {
    pub max_ltv: f64,
    pub coupon_apr: f64,
    pub facility_cap: f64,
    pub observed_leverage: Option<f64>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub samples: usize,
    pub baseline_delay_m: Option<f64>,
    pub pd_path: Option<f64>,
    pub lgd: Option<f64>,
    pub comps_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub mode: Mode,
    pub inputs: Value,
    pub core_valuation: Band,
    pub components: Components,
    pub overlays: OverlayDiagnostics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collateral: Option<CollateralReport>,
    pub token_economics: TokenEconomics,
    pub expected_returns: ExpectedReturns,
    pub risk_meta: RiskMeta,
    pub nav: Nav,
    pub token_pricing: TokenPricing,
    pub investor_summary: String,
    pub developer_offer: DeveloperOffer,
    pub diagnostics: Diagnostics,
}

/// Outcome of a valuation call: `{status: "done", ...}` or `{status: "error", errors}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ValuationResponse {
    Done(Box<ValuationResult>),
    Error { errors: Vec<ValidationIssue> },
}
