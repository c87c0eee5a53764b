//! Phase grid generation.
//!
//! The harmonic phase `C` is located by a deterministic grid search over its
//! admissible range before a local refinement.
//!
//! Why a grid first?
//! - The profiled objective is periodic in `C` and can have several local minima.
//! - It is deterministic given the same calibration points.
//! - With one nonlinear parameter, a 1° grid is cheap.

use crate::error::AppError;

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::fit(format!(
            "Invalid phase range: min={min}, max={max} (must be finite and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::fit("Phase grid steps must be >= 2."));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(min + step * i as f64);
    }
    // Land exactly on the upper bound.
    if let Some(last) = out.last_mut() {
        *last = max;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_space_includes_endpoints() {
        let v = lin_space(0.0, 180.0, 181).unwrap();
        assert_eq!(v.len(), 181);
        assert_eq!(v[0], 0.0);
        assert_eq!(v[180], 180.0);
        assert!((v[101] - 101.0).abs() < 1e-12);
    }

    #[test]
    fn lin_space_rejects_empty_range() {
        assert!(lin_space(1.0, 1.0, 10).is_err());
        assert!(lin_space(0.0, 1.0, 1).is_err());
    }
}
