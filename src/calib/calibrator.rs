//! Orbit calibration from a sub-solar point series.
//!
//! Steps (each event search is one [`find_extrema`] call):
//!
//! 1. obliquity: largest `|latitude|` of the series
//! 2. equinoxes: minima of `|latitude|` inside `|latitude| < 0.05°`, debounced
//!    by 20 days; their index parity splits them into vernal / autumnal, and
//!    the first two vernal equinoxes define the orbit length
//! 3. solstices: maxima of `|latitude|` inside `|latitude| > 0.999 · obliquity`,
//!    debounced by a quarter orbit; parity splits them into summer / winter
//! 4. perihelia: minima of the distance inside `distance < 1.01 · min`
//! 5. aphelia: maxima of the distance inside `distance > 0.99 · max`
//!
//! The harmonic correction is left at zero; `fit::fit_ls` completes the model.

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::domain::{
    CalibrationConfig, ExtremumEvent, ExtremumKind, Harmonic, OrbitModel, Sample, SeasonRadii, TimeSeries,
};
use crate::error::AppError;
use crate::track::find_extrema;

/// Equinox dates split by crossing direction.
#[derive(Debug, Clone)]
struct Equinoxes {
    vernal: Vec<NaiveDate>,
    autumnal: Vec<NaiveDate>,
}

/// Calibrate with the default detection thresholds.
pub fn calibrate(series: &TimeSeries) -> Result<OrbitModel, AppError> {
    calibrate_with(series, &CalibrationConfig::default())
}

pub fn calibrate_with(series: &TimeSeries, config: &CalibrationConfig) -> Result<OrbitModel, AppError> {
    let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
        return Err(AppError::input("Cannot calibrate an empty time series."));
    };

    let obliquity = series
        .max_abs_latitude()
        .ok_or_else(|| AppError::input("Time series has no finite latitude."))?;
    debug!(obliquity, "obliquity from series");

    let equinoxes = detect_equinoxes(series, config)?;
    let orbit_days = (equinoxes.vernal[1] - equinoxes.vernal[0]).num_days();
    if orbit_days <= 0 {
        return Err(AppError::insufficient_data(format!(
            "Vernal equinoxes {} and {} do not define a positive orbit length.",
            equinoxes.vernal[0], equinoxes.vernal[1]
        )));
    }
    let quarter = Duration::days(orbit_days / 4);

    let solstice_floor = config.solstice_ratio * obliquity;
    let solstices = dates(&find_extrema(
        series,
        |s| s.latitude.abs() > solstice_floor,
        |s| s.latitude.abs(),
        ExtremumKind::Max,
        quarter,
    ));
    let Some(&first_solstice) = solstices.first() else {
        return Err(AppError::insufficient_data(
            "No solstice found: the series does not reach the obliquity.",
        ));
    };
    let summer_first = first_solstice_is_summer(first_solstice, &equinoxes.vernal, &equinoxes.autumnal);
    let (summer, winter) = split_by_parity(&solstices, summer_first);
    if summer.is_empty() || winter.is_empty() {
        return Err(AppError::insufficient_data(format!(
            "Need both a summer and a winter solstice, found {} and {}.",
            summer.len(),
            winter.len()
        )));
    }
    debug!(summer = summer.len(), winter = winter.len(), "solstices detected");

    let (min_distance, max_distance) = series
        .distance_range()
        .ok_or_else(|| AppError::input("Time series has no finite distance."))?;

    let perihelion_ceiling = config.perihelion_ratio * min_distance;
    let perihelia = dates(&find_extrema(
        series,
        |s| s.distance < perihelion_ceiling,
        |s| s.distance,
        ExtremumKind::Min,
        quarter,
    ));

    let aphelion_floor = config.aphelion_ratio * max_distance;
    let aphelia = dates(&find_extrema(
        series,
        |s| s.distance > aphelion_floor,
        |s| s.distance,
        ExtremumKind::Max,
        quarter,
    ));
    debug!(perihelia = perihelia.len(), aphelia = aphelia.len(), "apsides detected");

    let radii = SeasonRadii {
        vernal: radius_at(series, equinoxes.vernal[0], "vernal equinox")?,
        summer: radius_at(series, summer[0], "summer solstice")?,
        autumnal: radius_at(series, equinoxes.autumnal[0], "autumnal equinox")?,
        winter: radius_at(series, winter[0], "winter solstice")?,
        perihelion: min_distance,
        aphelion: max_distance,
    };

    info!(
        orbit_days,
        obliquity,
        vernal = %equinoxes.vernal[0],
        "orbit calibrated on {first}..{last}"
    );

    Ok(OrbitModel {
        coverage: (first, last),
        obliquity,
        orbit_days,
        vernal_equinoxes: equinoxes.vernal,
        summer_solstices: summer,
        autumnal_equinoxes: equinoxes.autumnal,
        winter_solstices: winter,
        perihelia,
        aphelia,
        radii,
        harmonic: Harmonic::default(),
    })
}

fn detect_equinoxes(series: &TimeSeries, config: &CalibrationConfig) -> Result<Equinoxes, AppError> {
    let limit = config.equinox_latitude;
    let in_window = |s: &Sample| s.latitude.abs() < limit;

    let events = dates(&find_extrema(
        series,
        in_window,
        |s| s.latitude.abs(),
        ExtremumKind::Min,
        Duration::days(config.equinox_debounce_days),
    ));
    let ascending = first_crossing_ascends(series.samples(), in_window).unwrap_or(false);
    let (vernal, autumnal) = split_by_parity(&events, ascending);
    debug!(
        equinoxes = events.len(),
        vernal = vernal.len(),
        autumnal = autumnal.len(),
        ascending,
        "equinoxes detected"
    );

    if vernal.len() < 2 {
        return Err(AppError::insufficient_data(format!(
            "You need at least 2 vernal equinoxes to estimate the orbit length (found {}).",
            vernal.len()
        )));
    }
    Ok(Equinoxes { vernal, autumnal })
}

/// Whether the first in-window sample belongs to an ascending (south to north)
/// crossing of the equator.
///
/// A negative latitude means the sub-solar point is still approaching zero from
/// the south. A sample exactly on the equator is decided by the next sample.
fn first_crossing_ascends<F>(samples: &[Sample], in_window: F) -> Option<bool>
where
    F: Fn(&Sample) -> bool,
{
    let idx = samples.iter().position(|s| in_window(s))?;
    let latitude = samples[idx].latitude;
    if latitude != 0.0 {
        return Some(latitude < 0.0);
    }
    Some(samples.get(idx + 1).is_some_and(|next| next.latitude > 0.0))
}

/// Whether the first solstice is a summer (northern) solstice.
///
/// A solstice is summer when the last equinox before it is vernal. Before any
/// equinox, the next equinox decides: an autumnal one follows summer.
fn first_solstice_is_summer(solstice: NaiveDate, vernal: &[NaiveDate], autumnal: &[NaiveDate]) -> bool {
    let last_before = |list: &[NaiveDate]| list.iter().copied().filter(|d| *d < solstice).max();
    match (last_before(vernal), last_before(autumnal)) {
        (Some(v), Some(a)) => v > a,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => {
            let next_after = |list: &[NaiveDate]| list.iter().copied().filter(|d| *d > solstice).min();
            match (next_after(vernal), next_after(autumnal)) {
                (Some(v), Some(a)) => a < v,
                (None, Some(_)) => true,
                _ => false,
            }
        }
    }
}

/// Split alternating events: `(primary, secondary)`, where `primary` gets the
/// even-indexed events when `first_is_primary` holds and the odd-indexed ones
/// otherwise.
fn split_by_parity(events: &[NaiveDate], first_is_primary: bool) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    let even: Vec<NaiveDate> = events.iter().step_by(2).copied().collect();
    let odd: Vec<NaiveDate> = events.iter().skip(1).step_by(2).copied().collect();
    if first_is_primary { (even, odd) } else { (odd, even) }
}

fn dates(events: &[ExtremumEvent]) -> Vec<NaiveDate> {
    events.iter().map(|e| e.date).collect()
}

fn radius_at(series: &TimeSeries, date: NaiveDate, label: &str) -> Result<f64, AppError> {
    series
        .distance_on(date)
        .ok_or_else(|| AppError::input(format!("No sample on the {label} date {date}.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{SyntheticOrbit, generate_series};
    use crate::error::ErrorKind;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Duration::days(n)
    }

    fn days(list: &[i64]) -> Vec<NaiveDate> {
        list.iter().map(|&n| day(n)).collect()
    }

    /// A 360-day orbit sampled daily moves ~0.47° of latitude per day near an
    /// equinox, so the window must be wide enough to hold several samples.
    fn daily_window() -> CalibrationConfig {
        CalibrationConfig {
            equinox_latitude: 1.0,
            ..CalibrationConfig::default()
        }
    }

    #[test]
    fn sinusoid_equinoxes_land_on_crossing_days() {
        let series = generate_series(&SyntheticOrbit::default()).unwrap();
        let model = calibrate_with(&series, &daily_window()).unwrap();

        assert_eq!(model.vernal_equinoxes, days(&[0, 360, 720]));
        assert_eq!(model.autumnal_equinoxes, days(&[180, 540, 900]));
        assert_eq!(model.orbit_days, 360);
        assert!((model.obliquity - 26.73).abs() < 1e-12);
    }

    #[test]
    fn sinusoid_solstices_and_apsides() {
        let series = generate_series(&SyntheticOrbit::default()).unwrap();
        let model = calibrate_with(&series, &daily_window()).unwrap();

        assert_eq!(model.summer_solstices, days(&[90, 450, 810]));
        assert_eq!(model.winter_solstices, days(&[270, 630, 990]));
        assert_eq!(model.perihelia, days(&[100, 460, 820]));
        assert_eq!(model.aphelia, days(&[280, 640, 1000]));

        let (min, max) = series.distance_range().unwrap();
        assert_eq!(model.radii.perihelion, min);
        assert_eq!(model.radii.aphelion, max);
        assert_eq!(model.radii.vernal, series.samples()[0].distance);
        assert_eq!(model.radii.summer, series.samples()[90].distance);
        assert_eq!(model.harmonic, Harmonic::default());
    }

    #[test]
    fn series_starting_after_vernal_equinox() {
        let full = generate_series(&SyntheticOrbit::default()).unwrap();
        let series = TimeSeries::new(full.samples()[100..].to_vec()).unwrap();
        let model = calibrate_with(&series, &daily_window()).unwrap();

        assert_eq!(model.autumnal_equinoxes, days(&[180, 540, 900]));
        assert_eq!(model.vernal_equinoxes, days(&[360, 720]));
        assert_eq!(model.orbit_days, 360);
        assert_eq!(model.winter_solstices, days(&[270, 630, 990]));
        assert_eq!(model.summer_solstices, days(&[450, 810]));
    }

    #[test]
    fn series_starting_before_first_summer_solstice() {
        // First vernal equinox at day 360, first autumnal at 180: the day-90
        // solstice follows no equinox and precedes an autumnal one, so it is
        // a summer solstice.
        let full = generate_series(&SyntheticOrbit::default()).unwrap();
        let series = TimeSeries::new(full.samples()[30..].to_vec()).unwrap();
        let model = calibrate_with(&series, &daily_window()).unwrap();

        assert_eq!(model.vernal_equinoxes, days(&[360, 720]));
        assert_eq!(model.autumnal_equinoxes, days(&[180, 540, 900]));
        assert_eq!(model.summer_solstices, days(&[90, 450, 810]));
        assert_eq!(model.winter_solstices, days(&[270, 630, 990]));
    }

    #[test]
    fn single_equinox_sample_is_insufficient() {
        let samples = (0..100)
            .map(|n| Sample {
                date: day(n),
                latitude: -10.0 + 0.2 * n as f64,
                distance: 9.5,
            })
            .collect();
        let series = TimeSeries::new(samples).unwrap();
        let err = calibrate(&series).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn one_cycle_is_insufficient() {
        let orbit = SyntheticOrbit {
            cycles: 1,
            ..SyntheticOrbit::default()
        };
        let series = generate_series(&orbit).unwrap();
        let err = calibrate_with(&series, &daily_window()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn empty_series_is_an_input_error() {
        let err = calibrate(&TimeSeries::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn noisy_series_still_gives_positive_orbit() {
        let orbit = SyntheticOrbit {
            period_days: 720,
            cycles: 3,
            latitude_noise: 0.001,
            distance_noise: 0.001,
            seed: 11,
            ..SyntheticOrbit::default()
        };
        let series = generate_series(&orbit).unwrap();
        let model = calibrate_with(&series, &daily_window()).unwrap();
        assert!(model.orbit_days > 0);
        assert!((model.orbit_days - 720).abs() <= 2, "orbit={}", model.orbit_days);
        for pair in model.vernal_equinoxes.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn parity_split_follows_first_event() {
        let events = days(&[0, 10, 20, 30, 40]);
        let (a, b) = split_by_parity(&events, true);
        assert_eq!(a, days(&[0, 20, 40]));
        assert_eq!(b, days(&[10, 30]));
        let (a, b) = split_by_parity(&events, false);
        assert_eq!(a, days(&[10, 30]));
        assert_eq!(b, days(&[0, 20, 40]));
    }

    #[test]
    fn solstice_before_any_equinox() {
        // Summer solstice precedes the autumnal equinox.
        assert!(first_solstice_is_summer(day(5), &days(&[200]), &days(&[20])));
        // Winter solstice precedes the vernal equinox.
        assert!(!first_solstice_is_summer(day(5), &days(&[20]), &days(&[200])));
    }
}
