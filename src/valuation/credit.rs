//! Loan cashflows, coverage metrics and covenant tests.

use crate::domain::{CovenantCheck, CovenantHeadroom, Covenants, CreditMetrics, CreditReturns, Schedule};
use crate::math::cashflow::{IrrSearch, irr_bisection, npv};

/// Fallback discount rate when neither a credit rate nor a coupon is given.
pub const DEFAULT_CREDIT_RATE: f64 = 0.10;

/// Annual debt service: interest only for a bullet, level annuity otherwise.
pub fn annual_debt_service(loan: f64, apr: f64, tenor_months: u32, schedule: Schedule) -> f64 {
    match schedule {
        Schedule::Bullet => loan * apr,
        Schedule::Amortising => {
            let n_years = tenor_months.max(1) as f64 / 12.0;
            let r = apr.max(1e-6);
            let growth = (1.0 + r).powf(n_years);
            loan * (r * growth) / (growth - 1.0)
        }
    }
}

/// Whole years in the cash schedule; ties round to even.
pub fn loan_years(tenor_months: u32) -> usize {
    ((tenor_months as f64 / 12.0).round_ties_even() as usize).max(1)
}

pub fn credit_cashflows(loan: f64, apr: f64, tenor_months: u32, schedule: Schedule) -> Vec<f64> {
    let years = loan_years(tenor_months);
    let mut cfs = Vec::with_capacity(years + 1);
    cfs.push(-loan);
    match schedule {
        Schedule::Bullet => {
            cfs.extend(std::iter::repeat_n(loan * apr, years - 1));
            cfs.push(loan * (1.0 + apr));
        }
        Schedule::Amortising => {
            let ds = annual_debt_service(loan, apr, tenor_months, schedule);
            cfs.extend(std::iter::repeat_n(ds, years));
        }
    }
    cfs
}

/// The discount rate used for credit NPV.
pub fn credit_discount_rate(explicit: Option<f64>, apr: f64) -> f64 {
    explicit.unwrap_or(if apr > 0.0 { apr } else { DEFAULT_CREDIT_RATE })
}

pub fn credit_returns(
    loan: f64,
    apr: f64,
    tenor_months: u32,
    schedule: Schedule,
    discount_rate: f64,
) -> CreditReturns {
    if loan <= 0.0 || apr < 0.0 || tenor_months == 0 {
        return CreditReturns {
            irr: None,
            npv: None,
            apy: None,
            cashflows_annual: Vec::new(),
        };
    }
    let cfs = credit_cashflows(loan, apr, tenor_months, schedule);
    CreditReturns {
        irr: irr_bisection(&cfs, IrrSearch::ANNUAL),
        npv: Some(npv(&cfs, discount_rate)),
        apy: Some(apr),
        cashflows_annual: cfs,
    }
}

pub struct MetricInputs {
    pub collateral_value: Option<f64>,
    pub loan: f64,
    pub apr: f64,
    pub tenor_months: u32,
    pub schedule: Schedule,
    pub noi_annual: Option<f64>,
    pub build_cost: Option<f64>,
    pub soft_costs: Option<f64>,
}

pub fn credit_metrics(m: &MetricInputs) -> CreditMetrics {
    let ds = annual_debt_service(m.loan, m.apr, m.tenor_months, m.schedule);
    let noi = m.noi_annual.filter(|n| *n != 0.0);
    let cost = m.build_cost.unwrap_or(0.0) + m.soft_costs.unwrap_or(0.0);

    CreditMetrics {
        ltv: m
            .collateral_value
            .filter(|v| *v > 0.0)
            .map(|v| m.loan / v),
        ltc: (cost > 0.0).then(|| m.loan / cost),
        dscr: noi.filter(|_| ds > 0.0).map(|n| n / ds),
        icr: noi
            .filter(|_| m.loan > 0.0 && m.apr > 0.0)
            .map(|n| n / (m.loan * m.apr)),
        debt_service_annual: ds,
    }
}

/// Breach descriptions and signed headroom for each defined covenant.
///
/// A covenant whose metric is undefined is neither breached nor given
/// headroom.
pub fn evaluate_covenants(metrics: &CreditMetrics, covenants: &Covenants) -> CovenantCheck {
    let mut breaches = Vec::new();
    let mut headroom = CovenantHeadroom::default();

    if let (Some(ltv), Some(max)) = (metrics.ltv, covenants.max_ltv) {
        if ltv > max {
            breaches.push(format!("LTV {ltv:.2} > {max:.2}"));
        }
        headroom.to_max_ltv = Some(max - ltv);
    }
    if let (Some(dscr), Some(min)) = (metrics.dscr, covenants.min_dscr) {
        if dscr < min {
            breaches.push(format!("DSCR {dscr:.2} < {min:.2}"));
        }
        headroom.to_min_dscr = Some(dscr - min);
    }
    if let (Some(icr), Some(min)) = (metrics.icr, covenants.min_icr) {
        if icr < min {
            breaches.push(format!("ICR {icr:.2} < {min:.2}"));
        }
        headroom.to_min_icr = Some(icr - min);
    }

    CovenantCheck {
        covenants: covenants.clone(),
        breaches,
        headroom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(schedule: Schedule) -> MetricInputs {
        MetricInputs {
            collateral_value: Some(1_500_000.0),
            loan: 800_000.0,
            apr: 0.10,
            tenor_months: 24,
            schedule,
            noi_annual: Some(120_000.0),
            build_cost: None,
            soft_costs: None,
        }
    }

    #[test]
    fn bullet_metrics() {
        let m = credit_metrics(&inputs(Schedule::Bullet));
        assert!((m.ltv.unwrap() - 0.533_333).abs() < 1e-4);
        assert_eq!(m.debt_service_annual, 80_000.0);
        assert!((m.dscr.unwrap() - 1.5).abs() < 1e-12);
        assert!((m.icr.unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(m.ltc, None);
    }

    #[test]
    fn amortising_annuity_pays_off() {
        let ds = annual_debt_service(1000.0, 0.10, 24, Schedule::Amortising);
        // Two-year annuity at 10%: 576.19
        assert!((ds - 576.190_476).abs() < 1e-3);
        let cfs = credit_cashflows(1000.0, 0.10, 24, Schedule::Amortising);
        assert_eq!(cfs.len(), 3);
        let irr = irr_bisection(&cfs, IrrSearch::ANNUAL).unwrap();
        assert!((irr - 0.10).abs() < 1e-8);
    }

    #[test]
    fn bullet_returns_and_years() {
        let r = credit_returns(800_000.0, 0.10, 24, Schedule::Bullet, 0.10);
        assert_eq!(r.cashflows_annual, vec![-800_000.0, 80_000.0, 880_000.0]);
        assert!((r.irr.unwrap() - 0.10).abs() < 1e-8);
        assert!(r.npv.unwrap().abs() < 1e-6);
        assert_eq!(r.apy, Some(0.10));
        assert_eq!(loan_years(6), 1);
        assert_eq!(loan_years(30), 2);
        assert_eq!(loan_years(42), 4);
    }

    #[test]
    fn zero_coupon_bullet_has_no_irr() {
        let r = credit_returns(100.0, 0.0, 12, Schedule::Bullet, credit_discount_rate(None, 0.0));
        // -100 then +100: root at exactly 0.
        assert!(r.irr.map(|x| x.abs() < 1e-8).unwrap_or(true));
        assert_eq!(credit_discount_rate(None, 0.0), DEFAULT_CREDIT_RATE);
        assert_eq!(credit_discount_rate(Some(0.07), 0.12), 0.07);
    }

    #[test]
    fn covenants_breach_iff_threshold_missed() {
        let m = credit_metrics(&inputs(Schedule::Bullet));
        let ok = evaluate_covenants(
            &m,
            &Covenants {
                max_ltv: Some(0.60),
                min_dscr: Some(1.2),
                min_icr: None,
            },
        );
        assert!(ok.breaches.is_empty());
        assert!((ok.headroom.to_max_ltv.unwrap() - (0.60 - 0.533_333)).abs() < 1e-4);
        assert_eq!(ok.headroom.to_min_icr, None);

        let bad = evaluate_covenants(
            &m,
            &Covenants {
                max_ltv: Some(0.50),
                min_dscr: Some(2.0),
                min_icr: Some(1.0),
            },
        );
        assert_eq!(bad.breaches, vec!["LTV 0.53 > 0.50", "DSCR 1.50 < 2.00"]);
        assert!(bad.headroom.to_min_icr.unwrap() > 0.0);
    }
}
