//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during calibration and conversion
//! - saved to JSON and reloaded later without re-reading the ephemeris table
//! - printed by the report module

use std::f64::consts::TAU;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One astronomical unit in kilometres.
pub const ASTRONOMICAL_UNIT_KM: f64 = 149_597_870.7;

/// Length of a Titan day (one revolution around Saturn) in Earth days.
pub const TITAN_DAY_EARTH_DAYS: f64 = 15.945;

/// Box constraints of the harmonic coefficients.
pub const AMPLITUDE_BOUNDS: (f64, f64) = (-360.0, 360.0);
pub const OFFSET_BOUNDS: (f64, f64) = (-360.0, 360.0);
pub const PHASE_BOUNDS: (f64, f64) = (0.0, 180.0);

pub(crate) const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

/// A single observation of the sub-solar point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub date: NaiveDate,
    /// Sub-solar latitude (degrees north).
    pub latitude: f64,
    /// Heliocentric distance (AU).
    pub distance: f64,
}

/// Date-ordered sequence of samples.
///
/// Ordering is checked on construction: the extrema tracker relies on it to
/// measure the time elapsed since the running best.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(samples: Vec<Sample>) -> Result<Self, AppError> {
        if let Some(pos) = samples.windows(2).position(|w| w[1].date < w[0].date) {
            return Err(AppError::input(format!(
                "Time series is not date ordered: {} follows {}.",
                samples[pos + 1].date,
                samples[pos].date
            )));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.samples.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.samples.last().map(|s| s.date)
    }

    /// Distance recorded on `date` (first sample of that day).
    pub fn distance_on(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.samples.partition_point(|s| s.date < date);
        self.samples
            .get(idx)
            .filter(|s| s.date == date)
            .map(|s| s.distance)
    }

    /// Largest absolute sub-solar latitude of the series.
    pub fn max_abs_latitude(&self) -> Option<f64> {
        self.samples
            .iter()
            .map(|s| s.latitude.abs())
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }

    /// `(min, max)` heliocentric distance of the series.
    pub fn distance_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for s in &self.samples {
            if s.distance.is_finite() {
                min = min.min(s.distance);
                max = max.max(s.distance);
            }
        }
        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

/// Direction in which a tracked value "improves".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    Min,
    Max,
}

impl ExtremumKind {
    /// Strict comparison: ties never improve.
    pub fn improves(self, candidate: f64, best: f64) -> bool {
        match self {
            ExtremumKind::Min => candidate < best,
            ExtremumKind::Max => candidate > best,
        }
    }
}

/// A detected local extremum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtremumEvent {
    pub date: NaiveDate,
    pub value: f64,
    pub kind: ExtremumKind,
}

/// Harmonic correction between the mean linear phase and the solar longitude:
///
/// `360 * (date - Eq_V) / orbit = Ls + A * sin(2π (Ls - C) / 360) + B`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Harmonic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Harmonic {
    /// Phase of the sine term (radians) at solar longitude `ls`.
    pub fn angle(&self, ls: f64) -> f64 {
        TAU * (ls - self.c) / 360.0
    }

    /// `A * sin(2π (Ls - C) / 360)`.
    pub fn sine_term(&self, ls: f64) -> f64 {
        self.a * self.angle(ls).sin()
    }

    /// Correction `dLs(Ls) = A * sin(2π (Ls - C) / 360) + B`.
    pub fn correction(&self, ls: f64) -> f64 {
        self.sine_term(ls) + self.b
    }

    pub fn is_within_bounds(&self) -> bool {
        in_range(self.a, AMPLITUDE_BOUNDS) && in_range(self.b, OFFSET_BOUNDS) && in_range(self.c, PHASE_BOUNDS)
    }
}

fn in_range(v: f64, (lo, hi): (f64, f64)) -> bool {
    v.is_finite() && v >= lo && v <= hi
}

/// Heliocentric distance (AU) at the first occurrence of each orbital phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonRadii {
    pub vernal: f64,
    pub summer: f64,
    pub autumnal: f64,
    pub winter: f64,
    pub perihelion: f64,
    pub aphelion: f64,
}

/// Season lengths in Earth days, northern hemisphere naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonLengths {
    pub spring: i64,
    pub summer: i64,
    pub autumn: i64,
    pub winter: i64,
}

/// Calibrated orbit of the moon.
///
/// Built by the calibrator, completed by the harmonic fit, then only read by
/// the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitModel {
    /// First and last date of the series the model was calibrated on.
    pub coverage: (NaiveDate, NaiveDate),
    /// Maximum sub-solar latitude (degrees).
    pub obliquity: f64,
    /// Orbit length in Earth days (`vernal_equinoxes[1] - vernal_equinoxes[0]`).
    pub orbit_days: i64,
    pub vernal_equinoxes: Vec<NaiveDate>,
    pub summer_solstices: Vec<NaiveDate>,
    pub autumnal_equinoxes: Vec<NaiveDate>,
    pub winter_solstices: Vec<NaiveDate>,
    pub perihelia: Vec<NaiveDate>,
    pub aphelia: Vec<NaiveDate>,
    pub radii: SeasonRadii,
    pub harmonic: Harmonic,
}

impl Default for OrbitModel {
    /// Titan parameters computed from the NAIF SPICE kernels (1980-2032).
    fn default() -> Self {
        Self {
            coverage: (ymd(1980, 1, 2), ymd(2032, 12, 31)),
            obliquity: 26.730882944988142,
            orbit_days: 10751,
            vernal_equinoxes: vec![ymd(1980, 2, 22), ymd(2009, 7, 30)],
            summer_solstices: vec![ymd(1987, 11, 25), ymd(2017, 5, 14)],
            autumnal_equinoxes: vec![ymd(1995, 11, 7), ymd(2025, 4, 24)],
            winter_solstices: vec![ymd(2002, 10, 23), ymd(2032, 3, 26)],
            perihelia: vec![ymd(2003, 7, 21), ymd(2032, 11, 21)],
            aphelia: vec![ymd(1988, 8, 31), ymd(2018, 4, 7)],
            radii: SeasonRadii {
                vernal: 9.443302157356690,
                summer: 10.030529604959204,
                autumnal: 9.587968538637037,
                winter: 9.031185737728954,
                perihelion: 9.0077428463331,
                aphelion: 10.0728723166560,
            },
            harmonic: Harmonic {
                a: 6.1664830805512354,
                b: 6.0482745790986066,
                c: 101.03535416292833,
            },
        }
    }
}

impl OrbitModel {
    /// Reference vernal equinox (Ls = 0 of cycle 0).
    pub fn reference_vernal(&self) -> Result<NaiveDate, AppError> {
        self.vernal_equinoxes
            .first()
            .copied()
            .ok_or_else(|| AppError::input("Orbit model has no vernal equinox."))
    }

    /// Orbit length as a float, rejecting degenerate models.
    pub fn orbit_length(&self) -> Result<f64, AppError> {
        if self.orbit_days <= 0 {
            return Err(AppError::input(format!(
                "Orbit model has a non-positive orbit length ({} days).",
                self.orbit_days
            )));
        }
        Ok(self.orbit_days as f64)
    }

    /// Lengths of the four seasons of the first calibrated cycle.
    pub fn season_lengths(&self) -> Option<SeasonLengths> {
        let eq_v0 = *self.vernal_equinoxes.first()?;
        let eq_v1 = *self.vernal_equinoxes.get(1)?;
        let sol_s = *self.summer_solstices.first()?;
        let eq_a = *self.autumnal_equinoxes.first()?;
        let sol_w = *self.winter_solstices.first()?;
        Some(SeasonLengths {
            spring: (sol_s - eq_v0).num_days(),
            summer: (eq_a - sol_s).num_days(),
            autumn: (sol_w - eq_a).num_days(),
            winter: (eq_v1 - sol_w).num_days(),
        })
    }
}

/// Derivative used in the Newton step of the date -> Ls solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Derivative {
    /// `1 + A·2π/360·sin(...)`: the historical iteration, kept so existing
    /// outputs are reproduced step for step.
    #[default]
    Legacy,
    /// `1 + A·2π/360·cos(...)`: the analytic derivative of the residual.
    Analytic,
}

/// Numeric settings of the date -> Ls solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Convergence threshold on the Newton step (degrees).
    pub eps: f64,
    /// Maximum number of Newton steps.
    pub max_iter: usize,
    pub derivative: Derivative,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            eps: 1e-7,
            max_iter: 25,
            derivative: Derivative::Legacy,
        }
    }
}

/// Thresholds of the event detection windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConfig {
    /// Equinox window: `|latitude| < equinox_latitude` (degrees).
    pub equinox_latitude: f64,
    /// Debounce of the equinox tracker (days); the orbit is not known yet.
    pub equinox_debounce_days: i64,
    /// Solstice window: `|latitude| > solstice_ratio * obliquity`.
    pub solstice_ratio: f64,
    /// Perihelion window: `distance < perihelion_ratio * min(distance)`.
    pub perihelion_ratio: f64,
    /// Aphelion window: `distance > aphelion_ratio * max(distance)`.
    pub aphelion_ratio: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            equinox_latitude: 0.05,
            equinox_debounce_days: 20,
            solstice_ratio: 0.999,
            perihelion_ratio: 1.01,
            aphelion_ratio: 0.99,
        }
    }
}

/// Layout of the NAIF ephemeris table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Header lines skipped before the first data row.
    pub skip_rows: usize,
    /// Column indices of date, Z (sub-solar elevation), R (sub-point radius)
    /// and D (sun distance).
    pub columns: [usize; 4],
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            skip_rows: 21,
            columns: [0, 5, 6, 7],
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub layout: TableLayout,
    pub model_path: Option<PathBuf>,
    pub save_model: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub calibration: CalibrationConfig,
    pub solver: SolverConfig,
    pub plot_width: usize,
    pub plot_height: usize,
}
