//! Least squares solver for the linear market model.
//!
//! The prediction trainer fits two small regressions of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! where `x_i` is an intercept column followed by the market signals.
//!
//! Implementation choices:
//! - SVD handles the tall (rows > columns) design matrix directly.
//!   (Nalgebra's `QR::solve` is intended for square systems and panics for
//!   non-square matrices.)
//! - Signals such as `depth_units` and `rain_anom_pct` live on very different
//!   scales and are often nearly collinear in short histories, so we retry
//!   with progressively looser singular-value tolerances.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a design matrix with a leading intercept column.
pub fn design_with_intercept(rows: &[Vec<f64>]) -> DMatrix<f64> {
    let n = rows.len();
    let p = rows.first().map(|r| r.len()).unwrap_or(0) + 1;
    DMatrix::from_fn(n, p, |i, j| if j == 0 { 1.0 } else { rows[i][j - 1] })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn design_prepends_intercept() {
        let x = design_with_intercept(&[vec![4.0, 5.0], vec![6.0, 7.0]]);
        assert_eq!(x.ncols(), 3);
        assert_eq!(x[(0, 0)], 1.0);
        assert_eq!(x[(1, 2)], 7.0);
    }
}
