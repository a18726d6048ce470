//! Value overlays: rates, construction progress and delay, token liquidity.

use crate::domain::{ClimateSignals, EnsoPhase, Liquidity, Progress};

/// Value change per +100bp of discount rate.
const MACRO_SENS_PER_100BP: f64 = -0.05;

/// Discount applied to a project at 0% complete, tapering to 0 at 100%.
const PROGRESS_BASE_DISCOUNT: f64 = 0.08;

/// Months of delay per +1% rainfall anomaly.
const RAIN_MONTHS_PER_PCT: f64 = 0.01;

pub fn apply_macro(value: f64, delta_bps: f64) -> f64 {
    if delta_bps == 0.0 {
        return value;
    }
    (value * (1.0 + MACRO_SENS_PER_100BP * delta_bps / 100.0)).max(0.0)
}

fn stage_base_delay(stage: Option<&str>) -> f64 {
    match stage.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("groundworks") => 0.8,
        Some("structure") | None => 0.5,
        Some("services") => 0.3,
        Some("fitout") => 0.2,
        Some(_) => 0.3,
    }
}

/// Expected slip past the planned completion, in months.
///
/// Taken from `expected_completion_months` when given, otherwise estimated
/// from the build stage and weather. No progress block means no delay.
pub fn delay_months(progress: Option<&Progress>, climate: Option<&ClimateSignals>) -> f64 {
    let Some(progress) = progress else {
        return 0.0;
    };
    let planned = progress.planned_months();
    if let Some(expected) = progress.expected_completion_months {
        return (expected - planned).max(0.0);
    }

    let climate = climate.cloned().unwrap_or_default();
    let phase_adj = match climate.phase() {
        EnsoPhase::ElNino => 0.2,
        EnsoPhase::LaNina => 0.6,
        EnsoPhase::Neutral => 0.0,
    };
    let rain = RAIN_MONTHS_PER_PCT * climate.rain_anom_pct.max(0.0);
    stage_base_delay(progress.stage.as_deref()) + phase_adj + rain
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressAdjustment {
    pub value: f64,
    pub progress_discount: f64,
    pub delay_months: f64,
    pub delay_penalty: f64,
}

/// Discount for incomplete construction and carry cost of the expected delay.
pub fn apply_progress_and_delay(
    value: f64,
    progress: Option<&Progress>,
    climate: Option<&ClimateSignals>,
    finance_apr: f64,
) -> ProgressAdjustment {
    let pct = progress
        .and_then(|p| p.percent)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let progress_discount = PROGRESS_BASE_DISCOUNT * (1.0 - pct);
    let delay = delay_months(progress, climate);
    let delay_penalty = finance_apr / 12.0 * delay.max(0.0);
    ProgressAdjustment {
        value: (value * (1.0 - progress_discount) * (1.0 - delay_penalty)).max(0.0),
        progress_discount,
        delay_months: delay,
        delay_penalty,
    }
}

/// Premium (or discount) for how easily the token trades.
pub fn liquidity_premium(liquidity: Option<&Liquidity>) -> f64 {
    let Some(liq) = liquidity else {
        return 0.0;
    };
    if liq.spread_bps < 20.0 && liq.depth_units > 100_000.0 && liq.turnover_24h_pct > 5.0 {
        0.005
    } else if liq.spread_bps > 150.0 || liq.depth_units < 5_000.0 {
        -0.015
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_100bp_is_five_percent() {
        assert!((apply_macro(1000.0, 100.0) - 950.0).abs() < 1e-9);
        assert!((apply_macro(1000.0, -50.0) - 1025.0).abs() < 1e-9);
        assert_eq!(apply_macro(1000.0, 10_000.0), 0.0);
        assert_eq!(apply_macro(1000.0, 0.0), 1000.0);
    }

    #[test]
    fn delay_from_expected_or_signals() {
        let explicit = Progress {
            planned_completion_months: Some(18.0),
            expected_completion_months: Some(21.0),
            ..Progress::default()
        };
        assert_eq!(delay_months(Some(&explicit), None), 3.0);

        let early = Progress {
            expected_completion_months: Some(6.0),
            ..Progress::default()
        };
        assert_eq!(delay_months(Some(&early), None), 0.0);

        let derived = Progress {
            stage: Some("Groundworks".to_string()),
            ..Progress::default()
        };
        let climate = ClimateSignals {
            enso_phase: Some("la_nina".to_string()),
            rain_anom_pct: 20.0,
        };
        assert!((delay_months(Some(&derived), Some(&climate)) - (0.8 + 0.6 + 0.2)).abs() < 1e-12);

        assert!((delay_months(Some(&Progress::default()), None) - 0.5).abs() < 1e-12);
        assert_eq!(delay_months(None, Some(&climate)), 0.0);
    }

    #[test]
    fn progress_discount_without_block_is_full() {
        let adj = apply_progress_and_delay(1000.0, None, None, 0.12);
        assert!((adj.progress_discount - 0.08).abs() < 1e-12);
        assert_eq!(adj.delay_months, 0.0);
        assert!((adj.value - 920.0).abs() < 1e-9);
    }

    #[test]
    fn progress_complete_with_delay() {
        let p = Progress {
            percent: Some(1.0),
            planned_completion_months: Some(12.0),
            expected_completion_months: Some(14.0),
            ..Progress::default()
        };
        let adj = apply_progress_and_delay(1000.0, Some(&p), None, 0.12);
        assert_eq!(adj.progress_discount, 0.0);
        assert!((adj.delay_penalty - 0.02).abs() < 1e-12);
        assert!((adj.value - 980.0).abs() < 1e-9);
    }

    #[test]
    fn liquidity_tiers() {
        assert_eq!(liquidity_premium(None), 0.0);
        let deep = Liquidity {
            spread_bps: 10.0,
            depth_units: 200_000.0,
            turnover_24h_pct: 6.0,
        };
        assert_eq!(liquidity_premium(Some(&deep)), 0.005);
        assert_eq!(liquidity_premium(Some(&Liquidity::default())), -0.015);
        let mid = Liquidity {
            spread_bps: 50.0,
            depth_units: 20_000.0,
            turnover_24h_pct: 1.0,
        };
        assert_eq!(liquidity_premium(Some(&mid)), 0.0);
    }
}
