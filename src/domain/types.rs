//! Request-side domain types.
//!
//! Requests arrive as untyped JSON mappings. They are deserialized into
//! [`ValuationParams`] (every field optional) and then validated into the
//! tagged [`ValuationRequest`] union, so the math core only ever sees the
//! fields that are meaningful for its mode.

use serde::{Deserialize, Serialize};

/// Which valuation path to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Equity,
    Credit,
}

impl Mode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "equity" => Some(Mode::Equity),
            "credit" => Some(Mode::Credit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Equity => "equity",
            Mode::Credit => "credit",
        }
    }
}

/// Loan repayment profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// Interest-only, principal at maturity.
    Bullet,
    /// Level annual annuity.
    Amortising,
}

impl Schedule {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bullet" => Some(Schedule::Bullet),
            "amortising" | "amortizing" => Some(Schedule::Amortising),
            _ => None,
        }
    }
}

/// Shape of construction spend over the build timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpendCurve {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "front")]
    FrontLoaded,
    #[serde(rename = "back")]
    BackLoaded,
    #[serde(rename = "s-curve")]
    SCurve,
}

impl SpendCurve {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(SpendCurve::Linear),
            "front" => Some(SpendCurve::FrontLoaded),
            "back" => Some(SpendCurve::BackLoaded),
            "s-curve" | "scurve" | "s_curve" => Some(SpendCurve::SCurve),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpendCurve::Linear => "linear",
            SpendCurve::FrontLoaded => "front",
            SpendCurve::BackLoaded => "back",
            SpendCurve::SCurve => "s-curve",
        }
    }
}

/// Construction progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// planning | finance | groundworks | structure | services | fitout | pc | settlements
    pub stage: Option<String>,
    /// Completion in `0..=1`.
    pub percent: Option<f64>,
    pub planned_completion_months: Option<f64>,
    /// When absent, the delay is derived from stage and climate signals.
    pub expected_completion_months: Option<f64>,
}

impl Progress {
    pub const DEFAULT_PLANNED_MONTHS: f64 = 12.0;

    pub fn planned_months(&self) -> f64 {
        self.planned_completion_months
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(Self::DEFAULT_PLANNED_MONTHS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sales {
    pub presold_pct: Option<f64>,
    /// Multiplier vs feasibility model, e.g. `1.02` = +2%.
    pub avg_price_vs_model: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Costs {
    pub build_cost: Option<f64>,
    pub soft_costs: Option<f64>,
    /// `> 1` means over budget.
    pub actual_vs_budget: Option<f64>,
    pub contingency_remaining_pct: Option<f64>,
}

/// Order-book liquidity of the token market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Liquidity {
    pub spread_bps: f64,
    pub depth_units: f64,
    pub turnover_24h_pct: f64,
}

impl Default for Liquidity {
    fn default() -> Self {
        Self {
            spread_bps: 120.0,
            depth_units: 0.0,
            turnover_24h_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsoPhase {
    ElNino,
    LaNina,
    Neutral,
}

impl EnsoPhase {
    /// Unknown labels read as neutral.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "el_nino" => EnsoPhase::ElNino,
            "la_nina" => EnsoPhase::LaNina,
            _ => EnsoPhase::Neutral,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateSignals {
    /// el_nino | la_nina | neutral
    pub enso_phase: Option<String>,
    /// Percent rainfall anomaly vs median, e.g. `15` = +15%.
    pub rain_anom_pct: f64,
}

impl ClimateSignals {
    pub fn phase(&self) -> EnsoPhase {
        self.enso_phase
            .as_deref()
            .map(EnsoPhase::parse)
            .unwrap_or(EnsoPhase::Neutral)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroOverlay {
    /// +25 raises the discount rate by 25bp and lowers value.
    pub discount_rate_delta_bps: f64,
    /// 10-year rate level in bp; only read by the prediction overlay.
    pub rate_10y_bp: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collateral {
    pub value_override: Option<f64>,
    pub noi_annual: Option<f64>,
    pub capex_remaining: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Covenants {
    pub max_ltv: Option<f64>,
    pub min_dscr: Option<f64>,
    pub min_icr: Option<f64>,
}

/// Marketplace demand signals for the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDemand {
    pub watchlist_count: f64,
    pub bids_24h: f64,
    pub bid_volume: f64,
    pub ask_volume: f64,
    pub active_users_24h: f64,
    /// Exogenous demand index around 1.0.
    pub external_index: f64,
}

impl Default for MarketDemand {
    fn default() -> Self {
        Self {
            watchlist_count: 0.0,
            bids_24h: 0.0,
            bid_volume: 0.0,
            ask_volume: 0.0,
            active_users_24h: 0.0,
            external_index: 1.0,
        }
    }
}

/// Untyped request shape, exactly as it arrives over the interface.
///
/// Every field is optional here; [`crate::valuation::validate`] decides which
/// ones are required for the declared mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationParams {
    pub mode: Option<String>,
    pub address: Option<String>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub living_area_sqft: Option<f64>,
    pub year_built: Option<i32>,

    pub land_cost: Option<f64>,
    pub build_cost: Option<f64>,
    pub soft_costs: Option<f64>,
    pub sales_revenue: Option<f64>,
    pub exit_year: Option<i32>,
    pub discount_rate_equity: Option<f64>,
    pub debt_outstanding: Option<f64>,
    pub spend_curve: Option<String>,

    pub loan_amount: Option<f64>,
    pub coupon_apr: Option<f64>,
    pub tenor_months: Option<i64>,
    pub schedule: Option<String>,
    pub discount_rate_credit: Option<f64>,

    pub use_comps: Option<bool>,
    pub comps_radius_km: Option<f64>,
    pub blend_comps: Option<f64>,
    pub blend_hedonic: Option<f64>,

    pub progress: Option<Progress>,
    pub sales: Option<Sales>,
    pub costs: Option<Costs>,
    pub liquidity: Option<Liquidity>,
    pub climate_signals: Option<ClimateSignals>,
    #[serde(rename = "macro")]
    pub macro_overlay: Option<MacroOverlay>,
    pub collateral: Option<Collateral>,
    pub covenants: Option<Covenants>,
    pub demand: Option<MarketDemand>,

    pub tokens_outstanding: Option<i64>,
    pub seed: Option<u64>,
}

/// Physical facts about the subject property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFacts {
    pub address: String,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub living_area_sqft: Option<f64>,
    pub year_built: Option<i32>,
}

/// Optional overlay blocks shared by both modes.
///
/// `None` means the block was absent from the request; consumers treat an
/// absent block as neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlaySignals {
    pub progress: Option<Progress>,
    pub sales: Option<Sales>,
    pub costs: Option<Costs>,
    pub liquidity: Option<Liquidity>,
    pub climate: Option<ClimateSignals>,
    #[serde(rename = "macro")]
    pub macro_overlay: Option<MacroOverlay>,
    pub demand: Option<MarketDemand>,
}

impl OverlaySignals {
    pub fn macro_delta_bps(&self) -> f64 {
        self.macro_overlay
            .as_ref()
            .map(|m| m.discount_rate_delta_bps)
            .unwrap_or(0.0)
    }
}

/// How comparable sales feed the equity blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsOptions {
    pub use_comps: bool,
    pub radius_km: f64,
    pub blend_comps: f64,
    pub blend_hedonic: f64,
}

impl Default for CompsOptions {
    fn default() -> Self {
        Self {
            use_comps: false,
            radius_km: 2.0,
            blend_comps: 0.6,
            blend_hedonic: 0.4,
        }
    }
}

/// A validated equity (development project) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRequest {
    pub facts: PropertyFacts,
    pub land_cost: Option<f64>,
    pub build_cost: Option<f64>,
    pub soft_costs: Option<f64>,
    pub sales_revenue: Option<f64>,
    pub exit_year: Option<i32>,
    pub discount_rate: f64,
    pub debt_outstanding: f64,
    pub spend_curve: SpendCurve,
    pub comps: CompsOptions,
    pub overlays: OverlaySignals,
    pub tokens_outstanding: u64,
    pub seed: Option<u64>,
}

/// A validated credit (loan) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRequest {
    pub facts: PropertyFacts,
    pub loan_amount: f64,
    pub coupon_apr: f64,
    pub tenor_months: u32,
    pub schedule: Schedule,
    pub discount_rate: Option<f64>,
    pub collateral: Collateral,
    pub covenants: Covenants,
    pub overlays: OverlaySignals,
    pub tokens_outstanding: u64,
    pub seed: Option<u64>,
}

/// A validated request, tagged by mode.
#[derive(Debug, Clone, PartialEq)]
pub enum ValuationRequest {
    Equity(EquityRequest),
    Credit(CreditRequest),
}

impl ValuationRequest {
    pub fn mode(&self) -> Mode {
        match self {
            ValuationRequest::Equity(_) => Mode::Equity,
            ValuationRequest::Credit(_) => Mode::Credit,
        }
    }

    pub fn seed(&self) -> Option<u64> {
        match self {
            ValuationRequest::Equity(r) => r.seed,
            ValuationRequest::Credit(r) => r.seed,
        }
    }
}

/// A field-level validation problem.
///
/// Shaped like `{loc, msg, type}` so API clients can point at the offending
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub loc: String,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    pub fn missing(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: "field required".to_string(),
            kind: "missing".to_string(),
        }
    }

    pub fn invalid(loc: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: msg.into(),
            kind: "value_error".to_string(),
        }
    }

    pub fn parse(loc: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            msg: msg.into(),
            kind: "type_error".to_string(),
        }
    }
}
