//! Synthetic sub-solar point series.
//!
//! Produces a deterministic (seeded) series shaped like the NAIF table output:
//! a sinusoidal sub-solar latitude with zero crossings at multiples of half an
//! orbit, and an eccentric heliocentric distance. Optional Gaussian noise makes
//! it possible to exercise the debounce logic of the event tracker.
//!
//! Phases are computed from the integer day offset modulo the period, so every
//! cycle reproduces exactly the same values at the same orbital phase.

use std::f64::consts::TAU;

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Sample, TimeSeries};
use crate::error::AppError;

/// Shape of a synthetic orbit.
#[derive(Debug, Clone)]
pub struct SyntheticOrbit {
    /// Date of the first sample; also the first ascending (vernal) crossing.
    pub start: NaiveDate,
    pub period_days: i64,
    pub cycles: usize,
    pub step_days: i64,
    /// Latitude amplitude (degrees).
    pub obliquity: f64,
    /// Mean heliocentric distance (AU).
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Day offset (from `start`) of the first closest approach.
    pub perihelion_day: i64,
    /// Standard deviation of the latitude noise (degrees).
    pub latitude_noise: f64,
    /// Standard deviation of the distance noise (AU).
    pub distance_noise: f64,
    pub seed: u64,
}

impl Default for SyntheticOrbit {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            period_days: 360,
            cycles: 3,
            step_days: 1,
            obliquity: 26.73,
            semi_major_axis: 9.5,
            eccentricity: 0.05,
            perihelion_day: 100,
            latitude_noise: 0.0,
            distance_noise: 0.0,
            seed: 42,
        }
    }
}

impl SyntheticOrbit {
    /// Two noise-free orbits with Titan's period, obliquity and distances,
    /// starting at the 1980 vernal equinox.
    pub fn titan_like() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(1980, 2, 22).unwrap_or_default(),
            period_days: 10751,
            cycles: 2,
            semi_major_axis: 9.5403,
            eccentricity: 0.0558,
            perihelion_day: 8550,
            ..Self::default()
        }
    }
}

/// Sample `orbit` every `step_days` over all of its cycles.
pub fn generate_series(orbit: &SyntheticOrbit) -> Result<TimeSeries, AppError> {
    if orbit.period_days <= 0 || orbit.step_days <= 0 {
        return Err(AppError::input("Synthetic orbit period and step must be > 0 days."));
    }
    if orbit.cycles == 0 {
        return Err(AppError::input("Synthetic orbit needs at least one cycle."));
    }
    if !(orbit.eccentricity.is_finite() && (0.0..1.0).contains(&orbit.eccentricity)) {
        return Err(AppError::input("Synthetic eccentricity must be in [0, 1)."));
    }
    if !(orbit.latitude_noise >= 0.0 && orbit.distance_noise >= 0.0) {
        return Err(AppError::input("Synthetic noise levels must be >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(orbit.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::input(format!("Noise distribution error: {e}")))?;

    let period = orbit.period_days;
    let span = period * orbit.cycles as i64;
    let mut samples = Vec::with_capacity((span / orbit.step_days) as usize + 1);

    let mut t = 0;
    while t < span {
        let phase = TAU * (t % period) as f64 / period as f64;
        let anomaly = TAU * (t - orbit.perihelion_day).rem_euclid(period) as f64 / period as f64;

        let latitude = orbit.obliquity * phase.sin() + orbit.latitude_noise * normal.sample(&mut rng);
        let distance = orbit.semi_major_axis * (1.0 - orbit.eccentricity * anomaly.cos())
            + orbit.distance_noise * normal.sample(&mut rng);

        samples.push(Sample {
            date: orbit.start + Duration::days(t),
            latitude,
            distance,
        });
        t += orbit.step_days;
    }

    TimeSeries::new(samples)
}
