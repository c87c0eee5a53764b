//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the calibration/solver code stays clean and testable
//! - output changes are localized

use chrono::NaiveDate;

use crate::domain::{OrbitModel, TITAN_DAY_EARTH_DAYS};
use crate::fit::FitReport;

/// Mean Gregorian year and month, in days.
const YEAR_DAYS: f64 = 365.2425;
const MONTH_DAYS: f64 = 30.436875;

/// Split a day count into whole `(years, months, days)` using mean calendar
/// units.
pub fn orbit_calendar(days: i64) -> (i64, i64, i64) {
    let total = days as f64;
    let years = (total / YEAR_DAYS).floor() as i64;
    let months = (total / MONTH_DAYS).floor() as i64 - 12 * years;
    let rest = days - (years as f64 * YEAR_DAYS).floor() as i64 - (months as f64 * MONTH_DAYS).floor() as i64;
    (years, months, rest)
}

/// Format the full orbit model summary.
pub fn format_model_report(model: &OrbitModel) -> String {
    let mut out = String::new();
    let (years, months, days) = orbit_calendar(model.orbit_days);

    out.push_str(&format!("Date coverage: {} | {}\n", model.coverage.0, model.coverage.1));
    out.push_str(&format!(
        "Orbit       : {} days (Earth) = {years} years {months} months {days} days | {:.2} days (Titan)\n",
        model.orbit_days,
        model.orbit_days as f64 / TITAN_DAY_EARTH_DAYS
    ));
    out.push_str(&format!("Equinox  (V): {}\n", join_dates(&model.vernal_equinoxes)));
    out.push_str(&format!("Solstice (S): {}\n", join_dates(&model.summer_solstices)));
    out.push_str(&format!("Equinox  (A): {}\n", join_dates(&model.autumnal_equinoxes)));
    out.push_str(&format!("Solstice (W): {}\n", join_dates(&model.winter_solstices)));
    out.push_str(&format!("Obliquity   : {:.2} deg\n", model.obliquity));

    match model.season_lengths() {
        Some(seasons) => {
            let radii = &model.radii;
            for (name, length, ls, radius) in [
                ("Spring", seasons.spring, 0, radii.vernal),
                ("Summer", seasons.summer, 90, radii.summer),
                ("Autumn", seasons.autumn, 180, radii.autumnal),
                ("Winter", seasons.winter, 270, radii.winter),
            ] {
                out.push_str(&format!(
                    "N {name}    : {length} days (Earth) | {:.2} days (Titan) | Ls = {ls:>3} | R = {radius:.2} AU\n",
                    length as f64 / TITAN_DAY_EARTH_DAYS
                ));
            }
        }
        None => out.push_str("Seasons     : not enough events\n"),
    }

    out.push_str(&format!(
        "Perihelion  : {} | {:.2} AU\n",
        join_dates(&model.perihelia),
        model.radii.perihelion
    ));
    out.push_str(&format!(
        "Aphelion    : {} | {:.2} AU\n",
        join_dates(&model.aphelia),
        model.radii.aphelion
    ));
    out.push_str("360*(Date - Eq_V)/orbit = Ls + A * sin[2.PI/360 * (Ls - C)] + B\n");
    out.push_str(&format!(
        "with: A = {:.2} | B = {:.2} | C = {:.2}\n",
        model.harmonic.a, model.harmonic.b, model.harmonic.c
    ));

    out
}

/// Format the calibration points of a fit with their residuals.
pub fn format_fit_points(report: &FitReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:>6} {:>10} {:>10} {:>10}\n", "date", "Ls", "dLs", "fit", "residual"));
    out.push_str(&format!("{:-<12} {:-<6} {:-<10} {:-<10} {:-<10}\n", "", "", "", "", ""));

    for p in &report.points {
        let fitted = report.harmonic.correction(p.ls);
        out.push_str(&format!(
            "{:<12} {:>6.0} {:>10.4} {:>10.4} {:>10.4}\n",
            p.date.to_string(),
            p.ls,
            p.d_ls,
            fitted,
            p.d_ls - fitted
        ));
    }
    out.push_str(&format!("SSE = {:.6} deg^2\n", report.sse));
    out
}

fn join_dates(dates: &[NaiveDate]) -> String {
    if dates.is_empty() {
        return "-".to_string();
    }
    let parts: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
    parts.join(" | ")
}
