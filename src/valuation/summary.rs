//! Risk score, term-sheet hint and one-line investor summary.

use crate::domain::{Band, DeveloperOffer, Mode, RiskMeta};

/// Dispersion-based score: a tighter band means lower risk (0..=100).
pub fn risk_from_band(band: &Band) -> RiskMeta {
    let spread = (band.high - band.low).max(0.0);
    let pct = (spread / band.base.max(1.0)).min(1.0);
    let pct = if pct.is_finite() { pct } else { 1.0 };
    RiskMeta {
        risk_score: (100.0 * pct).round() as u8,
        band_spread_pct: pct,
    }
}

pub fn developer_offer(core_value: f64, observed_leverage: Option<f64>, risk_score: u8) -> DeveloperOffer {
    let (max_ltv, coupon_apr) = match risk_score {
        0..=30 => (0.55, 0.10),
        31..=60 => (0.50, 0.12),
        _ => (0.45, 0.14),
    };
    DeveloperOffer {
        max_ltv,
        coupon_apr,
        facility_cap: core_value * max_ltv,
        observed_leverage,
        notes: "Auto-hint; final terms subject to risk engine and credit committee.".to_string(),
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$1,234,567`.
pub fn fmt_money(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    let rounded = v.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 && rounded > 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

pub fn investor_summary(mode: Mode, band: &Band, irr: Option<f64>, equity_multiple: Option<f64>) -> String {
    let irr_txt = irr
        .filter(|x| x.is_finite())
        .map(|x| format!(", IRR ~ {:.1}%", x * 100.0))
        .unwrap_or_default();
    let range = format!(
        "base {} (range {} to {})",
        fmt_money(band.base),
        fmt_money(band.low),
        fmt_money(band.high)
    );
    match mode {
        Mode::Equity => {
            let em_txt = equity_multiple
                .filter(|x| x.is_finite())
                .map(|x| format!(", EM ~ {x:.2}"))
                .unwrap_or_default();
            format!(
                "Equity valuation: {range}{irr_txt}{em_txt}. Band reflects sales, cost and delay uncertainty. Liquidity and macro overlays applied."
            )
        }
        Mode::Credit => format!(
            "Credit valuation (price band): {range}{irr_txt}. Band reflects PD/LGD and rate spread shocks. Liquidity and macro overlays applied."
        ),
    }
}
