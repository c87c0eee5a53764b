use std::f64::consts::TAU;

use chrono::{Duration, NaiveDate};
use tracing::trace;

use crate::domain::{Derivative, OrbitModel, SolverConfig};
use crate::error::AppError;

/// Newton slopes smaller than this are treated as a vanishing derivative.
const MIN_SLOPE: f64 = 1e-12;

/// Solar longitude (degrees, `[0, 360)`) of `date`.
///
/// Solves `Ls - Ls0 + A·sin(2π(Ls - C)/360) = 0` where `Ls0` is the mean
/// linear phase of the date, starting from `Ls = Ls0`.
pub fn solve_longitude(model: &OrbitModel, date: NaiveDate, config: &SolverConfig) -> Result<f64, AppError> {
    let orbit = model.orbit_length()?;
    let vernal = model.reference_vernal()?;
    let harmonic = model.harmonic;

    let days = (date - vernal).num_days() as f64;
    let ls0 = (360.0 * days / orbit - harmonic.b).rem_euclid(360.0);
    let mut ls = ls0;

    for iter in 1..=config.max_iter {
        let theta = harmonic.angle(ls);
        let residual = ls - ls0 + harmonic.a * theta.sin();
        let trig = match config.derivative {
            Derivative::Legacy => theta.sin(),
            Derivative::Analytic => theta.cos(),
        };
        let slope = 1.0 + harmonic.a * TAU / 360.0 * trig;
        if !slope.is_finite() || slope.abs() < MIN_SLOPE {
            return Err(AppError::convergence(format!(
                "Newton derivative vanished at Ls={ls:.6} for {date} (iteration {iter})."
            )));
        }

        let step = -residual / slope;
        if !step.is_finite() {
            return Err(AppError::convergence(format!(
                "Newton step is not finite at Ls={ls:.6} for {date} (iteration {iter})."
            )));
        }
        ls += step;

        if step.abs() < config.eps {
            trace!(%date, iter, ls, "newton converged");
            return Ok(normalize_degrees(ls));
        }
    }

    Err(AppError::convergence(format!(
        "Newton iteration for {date} did not converge within {} steps.",
        config.max_iter
    )))
}

/// Date at solar longitude `ls` in cycle `year_offset` (0 is the cycle that
/// starts at the reference vernal equinox).
pub fn solve_date(model: &OrbitModel, ls: f64, year_offset: i64) -> Result<NaiveDate, AppError> {
    if !ls.is_finite() {
        return Err(AppError::input(format!("Solar longitude must be finite, got {ls}.")));
    }
    let orbit = model.orbit_length()?;
    let vernal = model.reference_vernal()?;

    let phase = ls + model.harmonic.correction(ls) + 360.0 * year_offset as f64;
    let days = (orbit / 360.0 * phase).round();
    if !days.is_finite() || days.abs() > i32::MAX as f64 {
        return Err(AppError::input(format!("Date for Ls={ls} cycle {year_offset} is out of range.")));
    }

    Duration::try_days(days as i64)
        .and_then(|offset| vernal.checked_add_signed(offset))
        .ok_or_else(|| AppError::input(format!("Date for Ls={ls} cycle {year_offset} is out of range.")))
}

/// Reduce an angle to `[0, 360)`.
fn normalize_degrees(value: f64) -> f64 {
    let r = value.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if r >= 360.0 { 0.0 } else { r }
}
