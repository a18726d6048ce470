//! Valuation orchestrator.
//!
//! Validates the request, runs the equity or credit path, and assembles the
//! result. Comps and market prediction are reached through the registry by
//! key; when either is missing or fails the run carries on without it.

use rand::Rng;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::{
    AdjustedComp, Band, CollateralReport, Components, CompsResponse, CreditRequest, Diagnostics,
    EquityRequest, ExpectedReturns, MarketForecast, Mode, OverlayDiagnostics, PredictionOverlay,
    SourceStatus, TokenEconomics, TokenPricing, ValuationRequest, ValuationResponse,
    ValuationResult,
};
use crate::registry::{COMPS, Engine, EngineRegistry, MARKET_PREDICTION};
use crate::valuation::credit::{
    MetricInputs, credit_discount_rate, credit_metrics, credit_returns, evaluate_covenants,
};
use crate::valuation::dcf::{DcfInputs, equity_dcf};
use crate::valuation::hedonic::hedonic_value;
use crate::valuation::monte_carlo::{
    CreditSimParams, EquitySimParams, LGD, SimOutcome, simulate_credit, simulate_equity,
};
use crate::valuation::overlays::{apply_macro, apply_progress_and_delay, liquidity_premium};
use crate::valuation::residual::residual_land_value;
use crate::valuation::summary::{developer_offer, investor_summary, risk_from_band};
use crate::valuation::token::{credit_nav, demand_index, equity_nav, market_price};
use crate::valuation::validate::parse_request;

const KM_TO_MILES: f64 = 0.621371;
const COMPS_LIMIT: usize = 8;
const DEFAULT_SUBJECT_SQFT: f64 = 1000.0;

/// A valuation response plus the raw Monte Carlo draws behind its band.
#[derive(Debug, Clone)]
pub struct ValuationOutcome {
    pub response: ValuationResponse,
    pub samples: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    config: EngineConfig,
}

impl ValuationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, params: &Value, registry: &EngineRegistry) -> ValuationOutcome {
        let request = match parse_request(params) {
            Ok(r) => r,
            Err(errors) => {
                debug!(count = errors.len(), "valuation request rejected");
                return ValuationOutcome {
                    response: ValuationResponse::Error { errors },
                    samples: Vec::new(),
                };
            }
        };

        info!(mode = request.mode().as_str(), "valuation dispatched");
        let mut rng = self.config.rng_for(request.seed());
        let (result, sim) = match &request {
            ValuationRequest::Equity(req) => self.value_equity(req, params, registry, &mut rng),
            ValuationRequest::Credit(req) => self.value_credit(req, params, &mut rng),
        };

        ValuationOutcome {
            response: ValuationResponse::Done(Box::new(result)),
            samples: sim.samples,
        }
    }

    fn value_equity<R: Rng>(
        &self,
        req: &EquityRequest,
        params: &Value,
        registry: &EngineRegistry,
        rng: &mut R,
    ) -> (ValuationResult, SimOutcome) {
        let ov = &req.overlays;
        let hedonic = hedonic_value(&req.facts);
        let residual = residual_land_value(req.sales_revenue, req.build_cost, req.soft_costs);
        let comps = comps_component(req, registry);
        let comps_count = comps.used.len();

        let mut value = match comps.value {
            Some(cv) => req.comps.blend_comps * cv + req.comps.blend_hedonic * hedonic,
            None => hedonic,
        };
        if let Some(r) = residual {
            value = (value + r) / 2.0;
        }
        let macro_bps = ov.macro_delta_bps();
        value = apply_macro(value, macro_bps);

        let progress = ov.progress.as_ref();
        let adjusted =
            apply_progress_and_delay(value, progress, ov.climate.as_ref(), req.discount_rate);
        let liq_premium = liquidity_premium(ov.liquidity.as_ref());

        let planned = progress.map(|p| p.planned_months()).unwrap_or(12.0);
        let expected = progress
            .and_then(|p| p.expected_completion_months)
            .unwrap_or(planned + adjusted.delay_months);
        let sim_params = EquitySimParams {
            value: adjusted.value,
            planned_months: planned,
            expected_months: expected,
            finance_apr: req.discount_rate,
            liquidity_premium: liq_premium,
            samples: self.config.mc_samples,
        };
        let sim = simulate_equity(&sim_params, rng);
        let band = sim.band;

        let dcf = equity_dcf(&dcf_inputs(req, planned));

        let nav = equity_nav(band.base, req.debt_outstanding, req.tokens_outstanding);
        let demand = demand_index(ov.demand.as_ref(), ov.liquidity.as_ref());
        let prediction = prediction_overlay(params, registry);

        let risk = risk_from_band(&band);
        let leverage = (band.base > 0.0).then(|| req.debt_outstanding / band.base.max(1.0));
        let summary = investor_summary(Mode::Equity, &band, dcf.irr_annual, dcf.equity_multiple);

        let result = ValuationResult {
            mode: Mode::Equity,
            inputs: json!({ "params": params }),
            core_valuation: band,
            components: Components {
                hedonic: Some(hedonic),
                residual_land_value: residual,
                comps_value: comps.value,
                comps_used: comps.used,
                comps_source: comps.status,
            },
            overlays: OverlayDiagnostics {
                progress_discount: adjusted.progress_discount,
                delay_months: adjusted.delay_months,
                delay_penalty: adjusted.delay_penalty,
                macro_delta_bps: macro_bps,
                liquidity_premium: liq_premium,
            },
            collateral: None,
            token_economics: TokenEconomics {
                tokens_outstanding: req.tokens_outstanding,
                nav,
            },
            expected_returns: ExpectedReturns::Equity { equity_dcf: dcf },
            risk_meta: risk,
            nav,
            token_pricing: TokenPricing {
                nav_per_token: nav.nav_per_token,
                market_price_per_token: market_price(nav.nav_per_token, demand),
                demand_index: demand,
                prediction_overlay: prediction,
            },
            investor_summary: summary,
            developer_offer: developer_offer(band.base, leverage, risk.risk_score),
            diagnostics: Diagnostics {
                samples: sim.samples.len(),
                baseline_delay_m: Some(sim_params.baseline_delay()),
                pd_path: None,
                lgd: None,
                comps_count,
            },
        };
        (result, sim)
    }

    fn value_credit<R: Rng>(
        &self,
        req: &CreditRequest,
        params: &Value,
        rng: &mut R,
    ) -> (ValuationResult, SimOutcome) {
        let ov = &req.overlays;
        let costs = ov.costs.clone().unwrap_or_default();
        let collateral_value = req.collateral.value_override;

        let discount_rate = credit_discount_rate(req.discount_rate, req.coupon_apr);
        let returns = credit_returns(
            req.loan_amount,
            req.coupon_apr,
            req.tenor_months,
            req.schedule,
            discount_rate,
        );
        let metrics = credit_metrics(&MetricInputs {
            collateral_value,
            loan: req.loan_amount,
            apr: req.coupon_apr,
            tenor_months: req.tenor_months,
            schedule: req.schedule,
            noi_annual: req.collateral.noi_annual,
            build_cost: costs.build_cost,
            soft_costs: costs.soft_costs,
        });
        let covenant_check = evaluate_covenants(&metrics, &req.covenants);

        let sim_params = CreditSimParams {
            par: req.loan_amount,
            coupon_apr: req.coupon_apr,
            tenor_months: req.tenor_months,
            samples: self.config.mc_samples,
        };
        let sim = simulate_credit(&sim_params, rng);

        let macro_bps = ov.macro_delta_bps();
        let liq_premium = liquidity_premium(ov.liquidity.as_ref());
        let band: Band = sim
            .band
            .map(|v| apply_macro(v, macro_bps) * (1.0 + liq_premium));

        let nav = credit_nav(band.base, req.tokens_outstanding);
        let demand = demand_index(ov.demand.as_ref(), ov.liquidity.as_ref());
        let risk = risk_from_band(&band);
        let summary = investor_summary(Mode::Credit, &band, returns.irr, None);

        let result = ValuationResult {
            mode: Mode::Credit,
            inputs: json!({ "params": params }),
            core_valuation: band,
            components: Components {
                hedonic: None,
                residual_land_value: None,
                comps_value: None,
                comps_used: Vec::new(),
                comps_source: SourceStatus::NotRequested,
            },
            overlays: OverlayDiagnostics {
                progress_discount: 0.0,
                delay_months: 0.0,
                delay_penalty: 0.0,
                macro_delta_bps: macro_bps,
                liquidity_premium: liq_premium,
            },
            collateral: Some(CollateralReport {
                value: collateral_value,
                metrics,
                covenant_check,
            }),
            token_economics: TokenEconomics {
                tokens_outstanding: req.tokens_outstanding,
                nav,
            },
            expected_returns: ExpectedReturns::Credit(returns),
            risk_meta: risk,
            nav,
            token_pricing: TokenPricing {
                nav_per_token: nav.nav_per_token,
                market_price_per_token: market_price(nav.nav_per_token, demand),
                demand_index: demand,
                prediction_overlay: PredictionOverlay::none(),
            },
            investor_summary: summary,
            developer_offer: developer_offer(band.base, metrics.ltc, risk.risk_score),
            diagnostics: Diagnostics {
                samples: sim.samples.len(),
                baseline_delay_m: None,
                pd_path: (!sim.samples.is_empty()).then(|| sim_params.path_pd()),
                lgd: (!sim.samples.is_empty()).then_some(LGD),
                comps_count: 0,
            },
        };
        (result, sim)
    }
}

impl Engine for ValuationEngine {
    fn run(&self, params: &Value, registry: &EngineRegistry) -> Value {
        let outcome = self.evaluate(params, registry);
        serde_json::to_value(&outcome.response).unwrap_or_else(|e| {
            json!({
                "status": "error",
                "errors": [{"loc": "result", "msg": e.to_string(), "type": "serialization_error"}],
            })
        })
    }
}

/// Run a valuation with the default engine configuration.
pub fn run(params: &Value, registry: &EngineRegistry) -> Value {
    ValuationEngine::default().run(params, registry)
}

fn dcf_inputs(req: &EquityRequest, planned_months: f64) -> DcfInputs {
    let sales = req.overlays.sales.clone().unwrap_or_default();
    let costs = req.overlays.costs.clone().unwrap_or_default();
    let price_mult = sales.avg_price_vs_model.unwrap_or(1.0);
    let cost_mult = costs.actual_vs_budget.unwrap_or(1.0);

    DcfInputs {
        land_cost: req.land_cost.unwrap_or(0.0),
        build_cost: req.build_cost.or(costs.build_cost).unwrap_or(0.0) * cost_mult,
        soft_costs: req.soft_costs.or(costs.soft_costs).unwrap_or(0.0) * cost_mult,
        sales_revenue: req.sales_revenue.unwrap_or(0.0) * price_mult,
        exit_year: req.exit_year,
        discount_rate: req.discount_rate,
        timeline_months: (planned_months.round() as usize).max(1),
        presale_pct: sales.presold_pct.unwrap_or(0.0),
        spend_curve: req.spend_curve,
    }
}

struct CompsComponent {
    value: Option<f64>,
    used: Vec<AdjustedComp>,
    status: SourceStatus,
}

impl CompsComponent {
    fn without(status: SourceStatus) -> Self {
        Self {
            value: None,
            used: Vec::new(),
            status,
        }
    }
}

fn comps_component(req: &EquityRequest, registry: &EngineRegistry) -> CompsComponent {
    if !req.comps.use_comps {
        return CompsComponent::without(SourceStatus::NotRequested);
    }
    let facts = &req.facts;
    let query = json!({
        "address": facts.address,
        "radius_miles": (req.comps.radius_km * KM_TO_MILES).max(0.1),
        "limit": COMPS_LIMIT,
        "subject_sqft": facts.living_area_sqft.unwrap_or(DEFAULT_SUBJECT_SQFT),
        "subject_beds": facts.bedrooms,
        "subject_baths": facts.bathrooms,
    });
    let Some(raw) = registry.run(COMPS, &query) else {
        return CompsComponent::without(SourceStatus::Unavailable {
            reason: "comps engine not registered".to_string(),
        });
    };

    let response: CompsResponse = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "comps engine returned an unusable response");
            return CompsComponent::without(SourceStatus::Failed {
                reason: e.to_string(),
            });
        }
    };
    let estimate = response.summary.first().and_then(|s| {
        if s.weighted_psf.is_some() {
            Some(s.estimate_weighted)
        } else if s.median_psf.is_some() {
            Some(s.estimate_simple)
        } else {
            None
        }
    });
    match estimate {
        Some(v) if v.is_finite() && v > 0.0 => CompsComponent {
            value: Some(v),
            used: response.comps,
            status: SourceStatus::Used,
        },
        _ => CompsComponent {
            value: None,
            used: response.comps,
            status: SourceStatus::Unavailable {
                reason: "no comparable sales within radius".to_string(),
            },
        },
    }
}

fn prediction_overlay(params: &Value, registry: &EngineRegistry) -> PredictionOverlay {
    let Some(raw) = registry.run(MARKET_PREDICTION, params) else {
        return PredictionOverlay::none();
    };
    match serde_json::from_value::<MarketForecast>(raw) {
        Ok(f) => PredictionOverlay::Forecast(f),
        Err(e) => {
            warn!(error = %e, "market prediction returned an unusable response");
            PredictionOverlay::none()
        }
    }
}
