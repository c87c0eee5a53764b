//! Linear least squares.
//!
//! The harmonic correction `dLs = A·sin(2π(Ls - C)/360) + B` is linear in
//! `(A, B)` once the phase `C` is fixed, so the fitter solves this small
//! problem once per candidate phase:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD handles the tall (more rows than columns) design matrix, and degrades
//!   gracefully to the minimum-norm solution when the sine column is constant.
//! - The problem has two columns, so the decomposition cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Sum of squared residuals of `y ≈ x β`.
pub fn sum_squared_residuals(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    (y - x * beta).norm_squared()
}
