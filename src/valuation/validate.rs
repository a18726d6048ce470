//! Request validation: untyped JSON in, tagged [`ValuationRequest`] out.
//!
//! Every problem found is reported, not only the first one.

use serde_json::{Map, Number, Value};

use crate::domain::{
    CompsOptions, CreditRequest, EquityRequest, Mode, OverlaySignals, PropertyFacts, Schedule,
    SpendCurve, ValidationIssue, ValuationParams, ValuationRequest,
};

pub const DEFAULT_TOKENS: i64 = 1_000_000;
pub const DEFAULT_EQUITY_RATE: f64 = 0.12;
/// Upper bound on completion and loan horizons; the DCF and credit schedules
/// allocate one slot per period.
pub const MAX_HORIZON_MONTHS: i64 = 600;

const INTEGER_FIELDS: [&str; 5] = ["year_built", "exit_year", "tenor_months", "tokens_outstanding", "seed"];

pub fn parse_request(params: &Value) -> Result<ValuationRequest, Vec<ValidationIssue>> {
    let Value::Object(map) = params else {
        return Err(vec![ValidationIssue::parse("body", "request body must be a JSON object")]);
    };

    let mut issues = Vec::new();
    let p = typed_params(map, &mut issues);

    let mode = match p.mode.as_deref() {
        None => {
            if !issues.iter().any(|i| i.loc == "mode") {
                issues.push(ValidationIssue::missing("mode"));
            }
            None
        }
        Some(raw) => {
            let mode = Mode::parse(raw);
            if mode.is_none() {
                issues.push(ValidationIssue::invalid("mode", "mode must be 'equity' or 'credit'"));
            }
            mode
        }
    };

    check_common(&p, &mut issues);
    match mode {
        Some(Mode::Equity) => check_equity(&p, &mut issues),
        Some(Mode::Credit) => check_credit(&p, &mut issues),
        None => {}
    }

    if !issues.is_empty() {
        return Err(issues);
    }
    match mode {
        Some(Mode::Equity) => Ok(ValuationRequest::Equity(build_equity(p))),
        Some(Mode::Credit) => Ok(ValuationRequest::Credit(build_credit(p))),
        None => Err(vec![ValidationIssue::missing("mode")]),
    }
}

/// Deserialize field by field so one bad field does not hide the others.
fn typed_params(map: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> ValuationParams {
    let mut clean = Map::new();
    for (key, value) in map {
        let value = normalize_value(key, value);
        if value.is_null() {
            continue;
        }
        let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        match serde_json::from_value::<ValuationParams>(single) {
            Ok(_) => {
                clean.insert(key.clone(), value);
            }
            Err(e) => issues.push(ValidationIssue::parse(key.clone(), e.to_string())),
        }
    }
    // Each field was checked on its own above, so the merged object parses.
    serde_json::from_value(Value::Object(clean)).unwrap_or_default()
}

fn normalize_value(key: &str, value: &Value) -> Value {
    match value {
        Value::Object(inner) => Value::Object(
            inner
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ),
        Value::Number(n) if INTEGER_FIELDS.contains(&key) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Value::Number(Number::from(f as i64))
            }
            _ => value.clone(),
        },
        other => other.clone(),
    }
}

struct Bound {
    lo: Option<f64>,
    hi: Option<f64>,
    lo_exclusive: bool,
}

const NON_NEGATIVE: Bound = Bound { lo: Some(0.0), hi: None, lo_exclusive: false };
const POSITIVE: Bound = Bound { lo: Some(0.0), hi: None, lo_exclusive: true };
const UNIT: Bound = Bound { lo: Some(0.0), hi: Some(1.0), lo_exclusive: false };
const ANY: Bound = Bound { lo: None, hi: None, lo_exclusive: false };
const RATE: Bound = Bound { lo: Some(-1.0), hi: None, lo_exclusive: true };
const HORIZON: Bound = Bound { lo: Some(0.0), hi: Some(MAX_HORIZON_MONTHS as f64), lo_exclusive: false };

fn check(issues: &mut Vec<ValidationIssue>, loc: &str, value: Option<f64>, bound: Bound) {
    let Some(v) = value else { return };
    if !v.is_finite() {
        issues.push(ValidationIssue::invalid(loc, "value must be a finite number"));
        return;
    }
    if let Some(lo) = bound.lo {
        if bound.lo_exclusive && v <= lo {
            issues.push(ValidationIssue::invalid(loc, format!("ensure this value is greater than {lo}")));
            return;
        }
        if !bound.lo_exclusive && v < lo {
            issues.push(ValidationIssue::invalid(
                loc,
                format!("ensure this value is greater than or equal to {lo}"),
            ));
            return;
        }
    }
    if let Some(hi) = bound.hi {
        if v > hi {
            issues.push(ValidationIssue::invalid(loc, format!("ensure this value is less than or equal to {hi}")));
        }
    }
}

fn check_common(p: &ValuationParams, issues: &mut Vec<ValidationIssue>) {
    check(issues, "bedrooms", p.bedrooms, NON_NEGATIVE);
    check(issues, "bathrooms", p.bathrooms, NON_NEGATIVE);
    check(issues, "living_area_sqft", p.living_area_sqft, NON_NEGATIVE);
    if let Some(year) = p.year_built {
        if !(1800..=2100).contains(&year) {
            issues.push(ValidationIssue::invalid("year_built", "year_built must be between 1800 and 2100"));
        }
    }
    if let Some(tokens) = p.tokens_outstanding {
        if tokens < 1 {
            issues.push(ValidationIssue::invalid(
                "tokens_outstanding",
                "ensure this value is greater than or equal to 1",
            ));
        }
    }

    if let Some(progress) = &p.progress {
        check(issues, "progress.percent", progress.percent, UNIT);
        check(issues, "progress.planned_completion_months", progress.planned_completion_months, HORIZON);
        check(issues, "progress.expected_completion_months", progress.expected_completion_months, HORIZON);
    }
    if let Some(sales) = &p.sales {
        check(issues, "sales.presold_pct", sales.presold_pct, UNIT);
        check(issues, "sales.avg_price_vs_model", sales.avg_price_vs_model, NON_NEGATIVE);
    }
    if let Some(costs) = &p.costs {
        check(issues, "costs.build_cost", costs.build_cost, NON_NEGATIVE);
        check(issues, "costs.soft_costs", costs.soft_costs, NON_NEGATIVE);
        check(issues, "costs.actual_vs_budget", costs.actual_vs_budget, NON_NEGATIVE);
        check(issues, "costs.contingency_remaining_pct", costs.contingency_remaining_pct, UNIT);
    }
    if let Some(liq) = &p.liquidity {
        check(issues, "liquidity.spread_bps", Some(liq.spread_bps), NON_NEGATIVE);
        check(issues, "liquidity.depth_units", Some(liq.depth_units), NON_NEGATIVE);
        check(issues, "liquidity.turnover_24h_pct", Some(liq.turnover_24h_pct), NON_NEGATIVE);
    }
    if let Some(climate) = &p.climate_signals {
        check(issues, "climate_signals.rain_anom_pct", Some(climate.rain_anom_pct), ANY);
    }
    if let Some(m) = &p.macro_overlay {
        check(issues, "macro.discount_rate_delta_bps", Some(m.discount_rate_delta_bps), ANY);
        check(issues, "macro.rate_10y_bp", m.rate_10y_bp, ANY);
    }
    if let Some(d) = &p.demand {
        check(issues, "demand.watchlist_count", Some(d.watchlist_count), NON_NEGATIVE);
        check(issues, "demand.bids_24h", Some(d.bids_24h), NON_NEGATIVE);
        check(issues, "demand.bid_volume", Some(d.bid_volume), NON_NEGATIVE);
        check(issues, "demand.ask_volume", Some(d.ask_volume), NON_NEGATIVE);
        check(issues, "demand.active_users_24h", Some(d.active_users_24h), NON_NEGATIVE);
        check(issues, "demand.external_index", Some(d.external_index), NON_NEGATIVE);
    }
    if let Some(raw) = &p.spend_curve {
        if SpendCurve::parse(raw).is_none() {
            issues.push(ValidationIssue::invalid(
                "spend_curve",
                "spend_curve must be one of linear, front, back, s-curve",
            ));
        }
    }
    if let Some(raw) = &p.schedule {
        if Schedule::parse(raw).is_none() {
            issues.push(ValidationIssue::invalid(
                "schedule",
                "schedule must be one of bullet, amortising, amortizing",
            ));
        }
    }
}

fn check_equity(p: &ValuationParams, issues: &mut Vec<ValidationIssue>) {
    match p.address.as_deref().map(str::trim) {
        None => issues.push(ValidationIssue::missing("address")),
        Some("") => issues.push(ValidationIssue::invalid("address", "address must not be empty")),
        Some(_) => {}
    }
    check(issues, "land_cost", p.land_cost, NON_NEGATIVE);
    check(issues, "build_cost", p.build_cost, NON_NEGATIVE);
    check(issues, "soft_costs", p.soft_costs, NON_NEGATIVE);
    check(issues, "sales_revenue", p.sales_revenue, NON_NEGATIVE);
    check(issues, "discount_rate_equity", p.discount_rate_equity, RATE);
    check(issues, "debt_outstanding", p.debt_outstanding, NON_NEGATIVE);
    check(issues, "comps_radius_km", p.comps_radius_km, POSITIVE);
    check(issues, "blend_comps", p.blend_comps, NON_NEGATIVE);
    check(issues, "blend_hedonic", p.blend_hedonic, NON_NEGATIVE);
}

fn check_credit(p: &ValuationParams, issues: &mut Vec<ValidationIssue>) {
    match p.loan_amount {
        None => issues.push(ValidationIssue::missing("loan_amount")),
        Some(v) => check(issues, "loan_amount", Some(v), POSITIVE),
    }
    match p.coupon_apr {
        None => issues.push(ValidationIssue::missing("coupon_apr")),
        Some(v) => check(issues, "coupon_apr", Some(v), NON_NEGATIVE),
    }
    match p.tenor_months {
        None => issues.push(ValidationIssue::missing("tenor_months")),
        Some(t) if t < 1 => issues.push(ValidationIssue::invalid(
            "tenor_months",
            "ensure this value is greater than or equal to 1",
        )),
        Some(t) if t > MAX_HORIZON_MONTHS => issues.push(ValidationIssue::invalid(
            "tenor_months",
            format!("ensure this value is less than or equal to {MAX_HORIZON_MONTHS}"),
        )),
        Some(_) => {}
    }
    check(issues, "discount_rate_credit", p.discount_rate_credit, RATE);
    if let Some(c) = &p.collateral {
        check(issues, "collateral.value_override", c.value_override, NON_NEGATIVE);
        check(issues, "collateral.noi_annual", c.noi_annual, ANY);
        check(issues, "collateral.capex_remaining", c.capex_remaining, NON_NEGATIVE);
    }
    if let Some(c) = &p.covenants {
        check(issues, "covenants.max_ltv", c.max_ltv, NON_NEGATIVE);
        check(issues, "covenants.min_dscr", c.min_dscr, NON_NEGATIVE);
        check(issues, "covenants.min_icr", c.min_icr, NON_NEGATIVE);
    }
}

fn facts(p: &ValuationParams) -> PropertyFacts {
    PropertyFacts {
        address: p.address.clone().unwrap_or_default().trim().to_string(),
        bedrooms: p.bedrooms,
        bathrooms: p.bathrooms,
        living_area_sqft: p.living_area_sqft,
        year_built: p.year_built,
    }
}

fn overlays(p: &ValuationParams) -> OverlaySignals {
    OverlaySignals {
        progress: p.progress.clone(),
        sales: p.sales.clone(),
        costs: p.costs.clone(),
        liquidity: p.liquidity.clone(),
        climate: p.climate_signals.clone(),
        macro_overlay: p.macro_overlay.clone(),
        demand: p.demand.clone(),
    }
}

fn tokens(p: &ValuationParams) -> u64 {
    p.tokens_outstanding.unwrap_or(DEFAULT_TOKENS).max(1) as u64
}

fn build_equity(p: ValuationParams) -> EquityRequest {
    let defaults = CompsOptions::default();
    EquityRequest {
        facts: facts(&p),
        land_cost: p.land_cost,
        build_cost: p.build_cost,
        soft_costs: p.soft_costs,
        sales_revenue: p.sales_revenue,
        exit_year: p.exit_year,
        discount_rate: p.discount_rate_equity.unwrap_or(DEFAULT_EQUITY_RATE),
        debt_outstanding: p.debt_outstanding.unwrap_or(0.0),
        spend_curve: p
            .spend_curve
            .as_deref()
            .and_then(SpendCurve::parse)
            .unwrap_or(SpendCurve::SCurve),
        comps: CompsOptions {
            use_comps: p.use_comps.unwrap_or(defaults.use_comps),
            radius_km: p.comps_radius_km.unwrap_or(defaults.radius_km),
            blend_comps: p.blend_comps.unwrap_or(defaults.blend_comps),
            blend_hedonic: p.blend_hedonic.unwrap_or(defaults.blend_hedonic),
        },
        overlays: overlays(&p),
        tokens_outstanding: tokens(&p),
        seed: p.seed,
    }
}

fn build_credit(p: ValuationParams) -> CreditRequest {
    CreditRequest {
        facts: facts(&p),
        loan_amount: p.loan_amount.unwrap_or(0.0),
        coupon_apr: p.coupon_apr.unwrap_or(0.0),
        tenor_months: p.tenor_months.unwrap_or(1).clamp(1, MAX_HORIZON_MONTHS) as u32,
        schedule: p
            .schedule
            .as_deref()
            .and_then(Schedule::parse)
            .unwrap_or(Schedule::Bullet),
        discount_rate: p.discount_rate_credit,
        collateral: p.collateral.clone().unwrap_or_default(),
        covenants: p.covenants.clone().unwrap_or_default(),
        overlays: overlays(&p),
        tokens_outstanding: tokens(&p),
        seed: p.seed,
    }
}
