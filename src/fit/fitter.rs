//! Harmonic correction fit.
//!
//! The mean linear phase `360 · (date - Eq_V) / orbit` runs ahead of or behind
//! the true solar longitude because the orbit is eccentric. The difference is
//! modelled as
//!
//! ```text
//! dLs(Ls) = A · sin(2π (Ls - C) / 360) + B
//! ```
//!
//! and fitted on the four canonical phase points (Ls = 0, 90, 180, 270) under
//! the box constraints `A, B ∈ [-360, 360]`, `C ∈ [0, 180]`.
//!
//! Solution method (variable projection):
//! - for a fixed `C` the model is linear in `(A, B)`: solve it by least
//!   squares, falling back to the best point on the box boundary when the
//!   unconstrained solution leaves the box
//! - search `C` on a 1° grid (in parallel), then refine it by golden-section
//!   search inside the neighbouring grid cells

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{AMPLITUDE_BOUNDS, Harmonic, OFFSET_BOUNDS, OrbitModel, PHASE_BOUNDS};
use crate::error::AppError;
use crate::fit::phase_grid::lin_space;
use crate::math::{solve_least_squares, sum_squared_residuals};

/// Solar longitudes of the vernal equinox, summer solstice, autumnal equinox
/// and winter solstice.
pub const CANONICAL_LS: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

/// Grid resolution over `C ∈ [0, 180]` (1° spacing).
const PHASE_GRID_STEPS: usize = 181;

const REFINE_MAX_ITERS: usize = 200;
const REFINE_TOL: f64 = 1e-12;
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// One calibration sample of the harmonic fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Canonical solar longitude of the phase (degrees).
    pub ls: f64,
    /// Observed date of the phase.
    pub date: NaiveDate,
    /// Linear phase estimate minus the canonical longitude (degrees).
    pub d_ls: f64,
}

/// Outcome of [`fit_ls`].
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub points: Vec<CalibrationPoint>,
    pub harmonic: Harmonic,
    /// Sum of squared residuals at the solution (deg²).
    pub sse: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    idx: usize,
    harmonic: Harmonic,
    sse: f64,
}

/// Fit the harmonic correction of `model` and store it in the model.
pub fn fit_ls(model: &mut OrbitModel) -> Result<FitReport, AppError> {
    let points = calibration_points(model)?;
    let (harmonic, sse) = fit_harmonic(&points)?;
    model.harmonic = harmonic;

    info!(a = harmonic.a, b = harmonic.b, c = harmonic.c, sse, "harmonic correction fitted");
    Ok(FitReport {
        points,
        harmonic,
        sse,
    })
}

/// Build the four `(Ls, dLs)` samples from the first occurrence of each phase.
pub fn calibration_points(model: &OrbitModel) -> Result<Vec<CalibrationPoint>, AppError> {
    if model.orbit_days <= 0 {
        return Err(AppError::fit(format!(
            "Cannot fit the harmonic correction with an orbit of {} days.",
            model.orbit_days
        )));
    }
    let phases = [
        ("vernal equinox", model.vernal_equinoxes.first()),
        ("summer solstice", model.summer_solstices.first()),
        ("autumnal equinox", model.autumnal_equinoxes.first()),
        ("winter solstice", model.winter_solstices.first()),
    ];
    let reference = model
        .vernal_equinoxes
        .first()
        .copied()
        .ok_or_else(|| AppError::fit("Orbit model has no vernal equinox date."))?;
    let orbit = model.orbit_days as f64;

    phases
        .iter()
        .zip(CANONICAL_LS)
        .map(|(&(label, date), ls)| {
            let date = date
                .copied()
                .ok_or_else(|| AppError::fit(format!("Orbit model has no {label} date.")))?;
            let elapsed = (date - reference).num_days() as f64;
            Ok(CalibrationPoint {
                ls,
                date,
                d_ls: 360.0 * elapsed / orbit - ls,
            })
        })
        .collect()
}

/// Bounded least squares fit of `dLs = A·sin(2π(Ls - C)/360) + B`.
///
/// Returns the coefficients and the residual sum of squares.
pub fn fit_harmonic(points: &[CalibrationPoint]) -> Result<(Harmonic, f64), AppError> {
    if points.len() < 3 {
        return Err(AppError::fit(format!(
            "Need at least 3 calibration points to fit 3 coefficients, got {}.",
            points.len()
        )));
    }
    if points.iter().any(|p| !(p.ls.is_finite() && p.d_ls.is_finite())) {
        return Err(AppError::fit("Non-finite calibration point."));
    }

    let ls: Vec<f64> = points.iter().map(|p| p.ls).collect();
    let y = DVector::from_iterator(points.len(), points.iter().map(|p| p.d_ls));

    let grid = lin_space(PHASE_BOUNDS.0, PHASE_BOUNDS.1, PHASE_GRID_STEPS)?;
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &c)| {
            profile(c, &ls, &y).map(|(harmonic, sse)| Candidate { idx, harmonic, sse })
        })
        .collect();

    if candidates.is_empty() {
        return Err(AppError::fit("No valid phase candidate for the harmonic correction."));
    }

    // Deterministic selection: pick the minimum SSE; break ties by grid index.
    let mut best = &candidates[0];
    for c in &candidates[1..] {
        if c.sse < best.sse || (c.sse == best.sse && c.idx < best.idx) {
            best = c;
        }
    }
    debug!(c = best.harmonic.c, sse = best.sse, "best phase on grid");

    let step = grid[1] - grid[0];
    let lo = (best.harmonic.c - step).max(PHASE_BOUNDS.0);
    let hi = (best.harmonic.c + step).min(PHASE_BOUNDS.1);
    match refine_phase(lo, hi, &ls, &y) {
        Some((harmonic, sse)) if sse <= best.sse => Ok((harmonic, sse)),
        _ => Ok((best.harmonic, best.sse)),
    }
}

/// Golden-section search of the profiled objective over `C ∈ [lo, hi]`.
fn refine_phase(mut lo: f64, mut hi: f64, ls: &[f64], y: &DVector<f64>) -> Option<(Harmonic, f64)> {
    let mut a = hi - INV_PHI * (hi - lo);
    let mut b = lo + INV_PHI * (hi - lo);
    let mut fa = profile(a, ls, y)?.1;
    let mut fb = profile(b, ls, y)?.1;

    for _ in 0..REFINE_MAX_ITERS {
        if hi - lo < REFINE_TOL {
            break;
        }
        if fa < fb {
            hi = b;
            b = a;
            fb = fa;
            a = hi - INV_PHI * (hi - lo);
            fa = profile(a, ls, y)?.1;
        } else {
            lo = a;
            a = b;
            fa = fb;
            b = lo + INV_PHI * (hi - lo);
            fb = profile(b, ls, y)?.1;
        }
    }

    profile(0.5 * (lo + hi), ls, y)
}

/// Best `(A, B)` inside the box for a fixed phase `c`, with its SSE.
fn profile(c: f64, ls: &[f64], y: &DVector<f64>) -> Option<(Harmonic, f64)> {
    let unit = Harmonic { a: 1.0, b: 0.0, c };
    let x = DMatrix::from_fn(ls.len(), 2, |i, j| if j == 0 { unit.sine_term(ls[i]) } else { 1.0 });

    let beta = solve_least_squares(&x, y)?;
    let mut harmonic = Harmonic {
        a: beta[0],
        b: beta[1],
        c,
    };
    if !harmonic.is_within_bounds() {
        let (a, b) = best_on_boundary(&x, y);
        harmonic.a = a;
        harmonic.b = b;
    }

    let sse = sum_squared_residuals(&x, y, &DVector::from_row_slice(&[harmonic.a, harmonic.b]));
    sse.is_finite().then_some((harmonic, sse))
}

/// Minimise the (convex) objective over the edges of the `(A, B)` box.
///
/// Only called when the unconstrained minimum lies outside the box, in which
/// case the constrained minimum is on an edge.
fn best_on_boundary(x: &DMatrix<f64>, y: &DVector<f64>) -> (f64, f64) {
    let s = x.column(0);
    let n = y.len() as f64;
    let ss = s.norm_squared();
    let sse_of = |a: f64, b: f64| -> f64 { s.iter().zip(y.iter()).map(|(si, yi)| (yi - a * si - b).powi(2)).sum() };

    let mut edges = Vec::with_capacity(4);
    for a in [AMPLITUDE_BOUNDS.0, AMPLITUDE_BOUNDS.1] {
        let b = s.iter().zip(y.iter()).map(|(si, yi)| yi - a * si).sum::<f64>() / n;
        edges.push((a, b.clamp(OFFSET_BOUNDS.0, OFFSET_BOUNDS.1)));
    }
    for b in [OFFSET_BOUNDS.0, OFFSET_BOUNDS.1] {
        let a = if ss > 0.0 {
            s.iter().zip(y.iter()).map(|(si, yi)| si * (yi - b)).sum::<f64>() / ss
        } else {
            0.0
        };
        edges.push((a.clamp(AMPLITUDE_BOUNDS.0, AMPLITUDE_BOUNDS.1), b));
    }

    let mut best = (0.0, 0.0);
    let mut best_sse = f64::INFINITY;
    for (a, b) in edges {
        let sse = sse_of(a, b);
        if sse < best_sse {
            best = (a, b);
            best_sse = sse;
        }
    }
    best
}
