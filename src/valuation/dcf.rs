//! Monthly development pro forma and equity IRR.
//!
//! Month 0 buys the land, months `1..=T` spend build and soft costs along a
//! spend curve while presale deposits trickle in, and month `T+1` settles the
//! remaining revenue.

use crate::domain::{AnnualCashflow, DcfAssumptions, EquityDcf, SpendCurve};
use crate::math::cashflow::{IrrSearch, annualize_monthly, irr_bisection, monthly_from_annual, npv};

pub const PRESALE_DEPOSIT_PCT: f64 = 0.10;

#[derive(Debug, Clone, PartialEq)]
pub struct DcfInputs {
    pub land_cost: f64,
    pub build_cost: f64,
    pub soft_costs: f64,
    pub sales_revenue: f64,
    pub exit_year: Option<i32>,
    pub discount_rate: f64,
    pub timeline_months: usize,
    pub presale_pct: f64,
    pub spend_curve: SpendCurve,
}

/// Normalised spend weights over `t` months.
pub fn spend_weights(curve: SpendCurve, t: usize) -> Vec<f64> {
    let t = t.max(1);
    let raw: Vec<f64> = match curve {
        SpendCurve::Linear => vec![1.0; t],
        SpendCurve::FrontLoaded => (0..t).map(|i| (t - i).max(1) as f64).collect(),
        SpendCurve::BackLoaded => (0..t).map(|i| (i + 1) as f64).collect(),
        SpendCurve::SCurve => (0..t)
            .map(|i| {
                let x = (i as f64 + 0.5) / t as f64 - 0.5;
                1.0 / (1.0 + (-12.0 * x).exp())
            })
            .collect(),
    };
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / sum).collect()
}

pub fn monthly_cashflows(inputs: &DcfInputs) -> Vec<f64> {
    let t = inputs.timeline_months.max(1);
    let presale = inputs.presale_pct.clamp(0.0, 1.0);
    let deposit_per_month = inputs.sales_revenue * presale * PRESALE_DEPOSIT_PCT / t as f64;
    let settlement = inputs.sales_revenue * (1.0 - presale * PRESALE_DEPOSIT_PCT);
    let spend = inputs.build_cost + inputs.soft_costs;

    let mut cfs = Vec::with_capacity(t + 2);
    cfs.push(-inputs.land_cost);
    cfs.extend(
        spend_weights(inputs.spend_curve, t)
            .into_iter()
            .map(|w| -spend * w + deposit_per_month),
    );
    cfs.push(settlement);
    cfs
}

fn annual_rollup(cfs: &[f64]) -> Vec<AnnualCashflow> {
    let mut out: Vec<AnnualCashflow> = Vec::new();
    for (t, cf) in cfs.iter().enumerate() {
        let year = t / 12;
        match out.last_mut() {
            Some(last) if last.year == year => last.cf += cf,
            _ => out.push(AnnualCashflow { year, cf: *cf }),
        }
    }
    out
}

pub fn equity_dcf(inputs: &DcfInputs) -> EquityDcf {
    let cfs = monthly_cashflows(inputs);

    let irr_annual = irr_bisection(&cfs, IrrSearch::MONTHLY).map(annualize_monthly);
    let npv_value = npv(&cfs, monthly_from_annual(inputs.discount_rate));

    let invested: f64 = -cfs.iter().filter(|cf| **cf < 0.0).sum::<f64>();
    let returned: f64 = cfs.iter().filter(|cf| **cf > 0.0).sum();
    let equity_multiple = (invested > 0.0).then(|| returned / invested);

    EquityDcf {
        cashflows_annual: annual_rollup(&cfs),
        cashflows_monthly: cfs,
        irr_annual,
        npv: npv_value,
        equity_multiple,
        assumptions: DcfAssumptions {
            timeline_months: inputs.timeline_months.max(1),
            spend_curve: inputs.spend_curve,
            presale_pct: inputs.presale_pct.clamp(0.0, 1.0),
            presale_deposit_pct: PRESALE_DEPOSIT_PCT,
            discount_rate_equity: inputs.discount_rate,
            exit_year: inputs.exit_year,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> DcfInputs {
        DcfInputs {
            land_cost: 1_000_000.0,
            build_cost: 1_500_000.0,
            soft_costs: 200_000.0,
            sales_revenue: 3_600_000.0,
            exit_year: Some(2027),
            discount_rate: 0.12,
            timeline_months: 12,
            presale_pct: 0.5,
            spend_curve: SpendCurve::SCurve,
        }
    }

    #[test]
    fn weights_sum_to_one_and_have_shape() {
        for curve in [SpendCurve::Linear, SpendCurve::FrontLoaded, SpendCurve::BackLoaded, SpendCurve::SCurve] {
            let w = spend_weights(curve, 10);
            assert_eq!(w.len(), 10);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        let front = spend_weights(SpendCurve::FrontLoaded, 4);
        assert!(front[0] > front[3]);
        let s = spend_weights(SpendCurve::SCurve, 12);
        assert!(s[0] < s[6] && s[6] < s[11]);
    }

    #[test]
    fn cashflow_layout_and_totals() {
        let i = inputs();
        let cfs = monthly_cashflows(&i);
        assert_eq!(cfs.len(), 14);
        assert_eq!(cfs[0], -1_000_000.0);
        let total: f64 = cfs.iter().sum();
        let expected = -1_000_000.0 - 1_700_000.0 + 3_600_000.0;
        assert!((total - expected).abs() < 1e-6);
        assert!((cfs[13] - 3_600_000.0 * 0.95).abs() < 1e-6);
    }

    #[test]
    fn profitable_project_has_positive_irr() {
        let dcf = equity_dcf(&inputs());
        let irr = dcf.irr_annual.unwrap();
        assert!(irr > 0.0);
        assert!(dcf.npv > 0.0);
        assert!(dcf.equity_multiple.unwrap() > 1.0);
        let annual_total: f64 = dcf.cashflows_annual.iter().map(|a| a.cf).sum();
        let monthly_total: f64 = dcf.cashflows_monthly.iter().sum();
        assert!((annual_total - monthly_total).abs() < 1e-6);
        assert_eq!(dcf.cashflows_annual.len(), 2);
    }

    #[test]
    fn no_costs_means_no_irr() {
        let dcf = equity_dcf(&DcfInputs {
            land_cost: 0.0,
            build_cost: 0.0,
            soft_costs: 0.0,
            sales_revenue: 0.0,
            ..inputs()
        });
        assert_eq!(dcf.irr_annual, None);
        assert_eq!(dcf.equity_multiple, None);
        assert_eq!(dcf.npv, 0.0);
    }
}
