//! Order statistics used by the comps engine and the Monte Carlo bander.
//!
//! All functions are total: empty inputs yield `None` (or NaN percentiles)
//! instead of panicking, and NaN compares equal to everything.

use std::cmp::Ordering;

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut xs = values.to_vec();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    xs
}

/// Percentiles by linear interpolation on the sorted sample.
///
/// `q <= 0` returns the minimum and `q >= 1` the maximum. The output is
/// non-decreasing in `q`, which is what keeps `low <= base <= high`.
pub fn percentiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return vec![f64::NAN; qs.len()];
    }
    let xs = sorted(values);
    qs.iter().map(|&q| percentile_sorted(&xs, q)).collect()
}

fn percentile_sorted(xs: &[f64], q: f64) -> f64 {
    let n = xs.len();
    if q <= 0.0 {
        return xs[0];
    }
    if q >= 1.0 {
        return xs[n - 1];
    }
    let pos = q * (n as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return xs[lo];
    }
    let w = pos - lo as f64;
    xs[lo] * (1.0 - w) + xs[hi] * w
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let xs = sorted(values);
    let n = xs.len();
    if n % 2 == 1 {
        Some(xs[n / 2])
    } else {
        Some(0.5 * (xs[n / 2 - 1] + xs[n / 2]))
    }
}

/// Weighted median: the first value (in ascending order) at which the
/// cumulative weight reaches half the total.
///
/// When the cumulative weight lands exactly on the half-way mark the result
/// is the midpoint with the next value, so equal weights reproduce
/// [`median`]. Negative weights count as zero; a zero total falls back to the
/// unweighted median.
pub fn weighted_median(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.is_empty() || values.len() != weights.len() {
        return median(values);
    }
    let mut pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(weights)
        .map(|(&v, &w)| (v, w.max(0.0)))
        .collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    if !(total > 0.0) {
        return median(values);
    }
    let half = total / 2.0;
    let tol = total * 1e-12;

    let mut cum = 0.0;
    for (i, &(v, w)) in pairs.iter().enumerate() {
        cum += w;
        if (cum - half).abs() <= tol {
            if let Some(&(next, _)) = pairs[i + 1..].iter().find(|(_, w)| *w > 0.0) {
                return Some(0.5 * (v + next));
            }
            return Some(v);
        }
        if cum > half {
            return Some(v);
        }
    }
    pairs.last().map(|(v, _)| *v)
}

/// Quartiles (Q1, Q2, Q3) using the "exclusive" method: position
/// `j * (n + 1) / 4` in the sorted sample, linearly interpolated.
///
/// Requires at least two values.
pub fn quartiles_exclusive(values: &[f64]) -> Option<(f64, f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let xs = sorted(values);
    let m = n + 1;
    let q = |i: usize| -> f64 {
        let j = (i * m / 4).clamp(1, n - 1);
        let delta = (i * m) as f64 - (j * 4) as f64;
        (xs[j - 1] * (4.0 - delta) + xs[j] * delta) / 4.0
    };
    Some((q(1), q(2), q(3)))
}

/// Tukey fences `(Q1 - 1.5 IQR, Q3 + 1.5 IQR)`.
///
/// With fewer than four values the fences are the sample min and max, so
/// nothing gets trimmed.
pub fn iqr_bounds(values: &[f64]) -> (f64, f64) {
    if values.len() < 4 {
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 0.0);
        }
        return (lo, hi);
    }
    match quartiles_exclusive(values) {
        Some((q1, _, q3)) => {
            let iqr = q3 - q1;
            (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
        }
        None => (f64::NEG_INFINITY, f64::INFINITY),
    }
}
