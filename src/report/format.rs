//! Plain-text summaries.
//!
//! We keep formatting code in one place so:
//! - the valuation code stays clean and testable
//! - output changes are localized

use crate::domain::{
    AdjustedComp, CompsResponse, ExpectedReturns, ForecastDrivers, MarketForecast,
    PredictionOverlay, SourceStatus, ValidationIssue, ValuationResult,
};
use crate::registry::EngineInfo;
use crate::valuation::summary::fmt_money;

/// Format the full valuation summary (band, components, overlays, returns, token pricing).
pub fn format_valuation(result: &ValuationResult) -> String {
    let mut out = String::new();
    let band = &result.core_valuation;

    out.push_str(&format!("=== rev - {} valuation ===\n", result.mode.as_str()));
    out.push_str(&format!(
        "Band: low {} | base {} | high {}\n",
        fmt_money(band.low),
        fmt_money(band.base),
        fmt_money(band.high)
    ));
    out.push_str(&format!(
        "Risk: score {} | spread {}\n",
        result.risk_meta.risk_score,
        fmt_pct(Some(result.risk_meta.band_spread_pct))
    ));

    let c = &result.components;
    if c.hedonic.is_some() || c.residual_land_value.is_some() || c.comps_value.is_some() {
        out.push_str("\nComponents:\n");
        out.push_str(&format!("  hedonic          {}\n", fmt_opt_money(c.hedonic)));
        out.push_str(&format!("  residual land    {}\n", fmt_opt_money(c.residual_land_value)));
        out.push_str(&format!(
            "  comps            {} ({}, {} used)\n",
            fmt_opt_money(c.comps_value),
            source_label(&c.comps_source),
            c.comps_used.len()
        ));
    }

    let o = &result.overlays;
    out.push_str("\nOverlays:\n");
    out.push_str(&format!("  progress discount {}\n", fmt_pct(Some(o.progress_discount))));
    out.push_str(&format!(
        "  delay             {:.2} months (penalty {})\n",
        o.delay_months,
        fmt_pct(Some(o.delay_penalty))
    ));
    out.push_str(&format!("  macro             {:+.0} bp\n", o.macro_delta_bps));
    out.push_str(&format!("  liquidity premium {}\n", fmt_pct(Some(o.liquidity_premium))));

    if let Some(col) = &result.collateral {
        out.push_str("\nCollateral:\n");
        out.push_str(&format!("  value            {}\n", fmt_opt_money(col.value)));
        out.push_str(&format!(
            "  LTV {} | LTC {} | DSCR {} | ICR {}\n",
            fmt_ratio(col.metrics.ltv),
            fmt_ratio(col.metrics.ltc),
            fmt_ratio(col.metrics.dscr),
            fmt_ratio(col.metrics.icr)
        ));
        out.push_str(&format!(
            "  debt service     {} / yr\n",
            fmt_money(col.metrics.debt_service_annual)
        ));
        if col.covenant_check.breaches.is_empty() {
            out.push_str("  covenants        ok\n");
        } else {
            for b in &col.covenant_check.breaches {
                out.push_str(&format!("  BREACH           {b}\n"));
            }
        }
    }

    out.push_str("\nReturns:\n");
    match &result.expected_returns {
        ExpectedReturns::Equity { equity_dcf } => {
            out.push_str(&format!("  IRR (annual)     {}\n", fmt_pct(equity_dcf.irr_annual)));
            out.push_str(&format!("  NPV              {}\n", fmt_money(equity_dcf.npv)));
            out.push_str(&format!(
                "  equity multiple  {}\n",
                fmt_ratio(equity_dcf.equity_multiple)
            ));
            out.push_str(&format!(
                "  timeline         {} months ({})\n",
                equity_dcf.assumptions.timeline_months,
                equity_dcf.assumptions.spend_curve.as_str()
            ));
        }
        ExpectedReturns::Credit(r) => {
            out.push_str(&format!("  IRR              {}\n", fmt_pct(r.irr)));
            out.push_str(&format!("  NPV              {}\n", fmt_opt_money(r.npv)));
            out.push_str(&format!("  APY              {}\n", fmt_pct(r.apy)));
        }
    }

    let tp = &result.token_pricing;
    out.push_str("\nToken:\n");
    out.push_str(&format!(
        "  outstanding      {}\n",
        result.token_economics.tokens_outstanding
    ));
    out.push_str(&format!("  NAV / token      {:.6}\n", tp.nav_per_token));
    out.push_str(&format!(
        "  market / token   {:.6} (demand {:.3})\n",
        tp.market_price_per_token, tp.demand_index
    ));
    out.push_str(&format!(
        "  prediction       {}\n",
        prediction_label(&tp.prediction_overlay)
    ));

    let offer = &result.developer_offer;
    out.push_str(&format!(
        "\nOffer: max LTV {} at {} APR, cap {}\n",
        fmt_pct(Some(offer.max_ltv)),
        fmt_pct(Some(offer.coupon_apr)),
        fmt_money(offer.facility_cap)
    ));
    out.push_str(&format!("\n{}\n", result.investor_summary));
    out
}

pub fn format_errors(errors: &[ValidationIssue]) -> String {
    let mut out = String::from("Validation failed:\n");
    for e in errors {
        out.push_str(&format!("  {:<24} {} ({})\n", e.loc, e.msg, e.kind));
    }
    out
}

/// Format a comps search as a summary line plus a table.
pub fn format_comps(response: &CompsResponse) -> String {
    let mut out = String::new();
    if let Some(s) = response.summary.first() {
        out.push_str(&format!(
            "Comps near {} (radius {:.2} mi): {} used of {} in radius\n",
            s.address, s.radius_miles, s.count, s.quality.count_in_radius
        ));
        out.push_str(&format!(
            "PSF: median {} | weighted {} | spread {}\n",
            fmt_opt_money(s.median_psf),
            fmt_opt_money(s.weighted_psf),
            fmt_pct(s.quality.psf_spread_pct)
        ));
        out.push_str(&format!(
            "Estimate ({:.0} sqft): simple {} | weighted {}\n\n",
            s.subject_sqft,
            fmt_money(s.estimate_simple),
            fmt_money(s.estimate_weighted)
        ));
    }
    out.push_str(&format_comps_table(&response.comps));
    out
}

fn format_comps_table(rows: &[AdjustedComp]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<32} {:>12} {:>7} {:>8} {:>8} {:>7} {:>6}\n",
            "address", "price", "km", "psf", "psf_adj", "weight", "src"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<32} {:-<12} {:-<7} {:-<8} {:-<8} {:-<7} {:-<6}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for c in rows {
        out.push_str(
            format!(
                "{:<32} {:>12} {:>7.2} {:>8.0} {:>8.0} {:>7.3} {:<6}\n",
                truncate(&c.sale.address, 32),
                fmt_money(c.sale.price),
                c.distance_km,
                c.psf_raw,
                c.psf_adj,
                c.weight,
                truncate(&c.sale.source, 6),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_forecast(f: &MarketForecast) -> String {
    let mode = match &f.version {
        Some(v) => format!("{:?} ({v})", f.mode).to_lowercase(),
        None => format!("{:?}", f.mode).to_lowercase(),
    };
    let mut out = format!(
        "Market forecast [{mode}]: 1w {:+.4}% | 1m {:+.4}%\n",
        f.forecast_1w * 100.0,
        f.forecast_1m * 100.0
    );
    match &f.drivers {
        ForecastDrivers::Heuristic(d) => out.push_str(&format!(
            "  drivers: demand {:.3} | liquidity {:.3} | weather {:.3} | rates {:.5} | noise {:+.5}\n",
            d.demand_k, d.liq_k, d.weather, d.rates, d.noise
        )),
        ForecastDrivers::Model { model, features } => {
            out.push_str(&format!("  {model} on [{}]\n", features.join(", ")))
        }
    }
    out
}

pub fn format_engines(engines: &[EngineInfo]) -> String {
    let mut out = String::new();
    for e in engines {
        out.push_str(&format!("{:<18} {}\n", e.key, e.name));
        out.push_str(&format!("{:<18} {}\n", "", e.description));
    }
    out
}

fn source_label(status: &SourceStatus) -> String {
    match status {
        SourceStatus::Used => "used".to_string(),
        SourceStatus::NotRequested => "not requested".to_string(),
        SourceStatus::Unavailable { reason } => format!("unavailable: {reason}"),
        SourceStatus::Failed { reason } => format!("failed: {reason}"),
    }
}

fn prediction_label(p: &PredictionOverlay) -> String {
    match p {
        PredictionOverlay::Forecast(f) => format!(
            "{:?} 1w {:+.3}% / 1m {:+.3}%",
            f.mode,
            f.forecast_1w * 100.0,
            f.forecast_1m * 100.0
        )
        .to_lowercase(),
        PredictionOverlay::Unavailable { status } => status.clone(),
    }
}

fn fmt_opt_money(v: Option<f64>) -> String {
    v.map(fmt_money).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.2}%", x * 100.0),
        _ => "n/a".to_string(),
    }
}

fn fmt_ratio(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.3}"),
        _ => "n/a".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
