//! Shared calibration pipeline used by the `reload` and `demo` tokens.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! NAIF table -> time series -> event calibration -> harmonic fit
//!
//! The session then focuses on presentation (report, plot, exports).

use crate::calib::calibrate_with;
use crate::data::{SyntheticOrbit, generate_series};
use crate::domain::{CalibrationConfig, OrbitModel, RunConfig, TimeSeries};
use crate::error::AppError;
use crate::fit::{FitReport, fit_ls};
use crate::io::ingest::{IngestedSeries, load_naif_table};

/// All computed outputs of a calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    pub ingest: IngestedSeries,
    pub model: OrbitModel,
    pub fit: FitReport,
}

/// Execute the full pipeline from the configured NAIF table.
pub fn run_calibration(config: &RunConfig) -> Result<CalibrationRun, AppError> {
    let ingest = load_naif_table(&config.data_path, &config.layout)?;
    let (model, fit) = calibrate_and_fit(&ingest.series, &config.calibration)?;
    Ok(CalibrationRun { ingest, model, fit })
}

/// Execute the same pipeline on a generated series instead of a NAIF table.
pub fn run_synthetic(orbit: &SyntheticOrbit, calibration: &CalibrationConfig) -> Result<CalibrationRun, AppError> {
    let ingest = IngestedSeries::from_series(generate_series(orbit)?);
    let (model, fit) = calibrate_and_fit(&ingest.series, calibration)?;
    Ok(CalibrationRun { ingest, model, fit })
}

/// Calibrate the orbit on `series` and fit its harmonic correction.
pub fn calibrate_and_fit(
    series: &TimeSeries,
    calibration: &CalibrationConfig,
) -> Result<(OrbitModel, FitReport), AppError> {
    let mut model = calibrate_with(series, calibration)?;
    let fit = fit_ls(&mut model)?;
    Ok((model, fit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;

    use crate::domain::ymd;
    use crate::domain::{ASTRONOMICAL_UNIT_KM, SolverConfig, TableLayout};
    use crate::error::ErrorKind;
    use crate::solve::solve_longitude;

    const RADIUS_KM: f64 = 2575.0;

    fn naif_text(series: &TimeSeries) -> String {
        let mut text = String::new();
        for i in 0..21 {
            writeln!(text, "header {i}").unwrap();
        }
        for s in series.samples() {
            writeln!(
                text,
                "{} 0 0 0 0 {} {} {}",
                s.date,
                RADIUS_KM * s.latitude.to_radians().sin(),
                RADIUS_KM,
                s.distance * ASTRONOMICAL_UNIT_KM
            )
            .unwrap();
        }
        text
    }

    /// Daily samples of a 360-day orbit cross ~0.47° of latitude per day.
    fn daily_window() -> CalibrationConfig {
        CalibrationConfig {
            equinox_latitude: 1.0,
            ..CalibrationConfig::default()
        }
    }

    fn run_config(data_path: std::path::PathBuf) -> RunConfig {
        RunConfig {
            data_path,
            layout: TableLayout::default(),
            model_path: None,
            save_model: None,
            export: None,
            calibration: daily_window(),
            solver: SolverConfig::default(),
            plot_width: 72,
            plot_height: 20,
        }
    }

    #[test]
    fn synthetic_orbit_has_no_correction() {
        let orbit = SyntheticOrbit::default();
        let series = generate_series(&orbit).unwrap();
        let (model, fit) = calibrate_and_fit(&series, &daily_window()).unwrap();

        assert_eq!(model.orbit_days, 360);
        assert!(fit.harmonic.a.abs() < 1e-9);
        assert!(fit.harmonic.b.abs() < 1e-9);
        assert!(fit.sse < 1e-12);
        assert_eq!(model.harmonic, fit.harmonic);
    }

    #[test]
    fn calibrates_from_a_naif_file() {
        let orbit = SyntheticOrbit::default();
        let series = generate_series(&orbit).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NAIF-Titan.dat");
        std::fs::write(&path, naif_text(&series)).unwrap();

        let run = run_calibration(&run_config(path)).unwrap();
        assert_eq!(run.ingest.rows_used, series.len());
        assert!(run.ingest.row_errors.is_empty());
        assert_eq!(run.model.orbit_days, 360);
        assert_eq!(run.model.vernal_equinoxes[0], orbit.start);
        assert!((run.model.obliquity - orbit.obliquity).abs() < 1e-9);

        let ls = solve_longitude(&run.model, run.model.summer_solstices[0], &SolverConfig::default()).unwrap();
        assert!((ls - 90.0).abs() < 1e-6, "{ls}");
    }

    #[test]
    fn titan_like_orbit_calibrates_with_default_thresholds() {
        let run = run_synthetic(&SyntheticOrbit::titan_like(), &CalibrationConfig::default()).unwrap();
        let model = &run.model;

        assert_eq!(run.ingest.rows_used, 2 * 10751);
        assert_eq!(model.vernal_equinoxes, vec![ymd(1980, 2, 22), ymd(2009, 7, 30)]);
        assert_eq!(model.autumnal_equinoxes, vec![ymd(1994, 11, 11), ymd(2024, 4, 18)]);
        assert_eq!(model.orbit_days, 10751);
        assert_eq!(model.perihelia, vec![ymd(2003, 7, 21), ymd(2032, 12, 26)]);
        assert_eq!(model.aphelia, vec![ymd(1988, 10, 31), ymd(2018, 4, 8)]);
        assert!(run.fit.harmonic.a.abs() < 0.05, "{:?}", run.fit.harmonic);
    }

    #[test]
    fn missing_table_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_calibration(&run_config(dir.path().join("absent.dat"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
