//! Discounting and internal-rate-of-return helpers.
//!
//! Cashflows are indexed by period: `cfs[t]` is discounted by `(1 + r)^t`.

/// Net present value of `cfs` at per-period rate `rate`.
pub fn npv(cfs: &[f64], rate: f64) -> f64 {
    let base = 1.0 + rate;
    cfs.iter()
        .enumerate()
        .map(|(t, cf)| cf / base.powi(t as i32))
        .sum()
}

/// Bracket and iteration budget for the bisection solver.
#[derive(Debug, Clone, Copy)]
pub struct IrrSearch {
    pub lo: f64,
    pub hi: f64,
    pub iters: usize,
}

impl IrrSearch {
    /// Monthly development cashflows.
    pub const MONTHLY: IrrSearch = IrrSearch {
        lo: -0.95,
        hi: 2.0,
        iters: 100,
    };

    /// Annual loan cashflows.
    pub const ANNUAL: IrrSearch = IrrSearch {
        lo: -0.95,
        hi: 1.0,
        iters: 80,
    };
}

const NPV_TOL: f64 = 1e-10;

/// Per-period IRR by bisection on `npv(rate) = 0`.
///
/// Returns `None` when the bracket endpoints do not straddle a sign change
/// (there is no real IRR inside the bracket) or when NPV is not finite at
/// an endpoint. Otherwise returns the root, or the bracket midpoint once the
/// iteration budget is spent.
pub fn irr_bisection(cfs: &[f64], search: IrrSearch) -> Option<f64> {
    let (mut lo, mut hi) = (search.lo, search.hi);
    let mut f_lo = npv(cfs, lo);
    let f_hi = npv(cfs, hi);
    if !(f_lo.is_finite() && f_hi.is_finite()) {
        return None;
    }
    if f_lo * f_hi > 0.0 {
        return None;
    }
    if f_lo == 0.0 && f_hi == 0.0 {
        // All-zero cashflows: every rate is a root.
        return None;
    }

    for _ in 0..search.iters {
        let mid = 0.5 * (lo + hi);
        let f_mid = npv(cfs, mid);
        if f_mid.abs() < NPV_TOL {
            return Some(mid);
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Convert a monthly rate to its annual equivalent.
pub fn annualize_monthly(rate_m: f64) -> f64 {
    (1.0 + rate_m).powi(12) - 1.0
}

/// Convert an annual rate to its monthly equivalent.
pub fn monthly_from_annual(rate_a: f64) -> f64 {
    (1.0 + rate_a).powf(1.0 / 12.0) - 1.0
}
