//! NAIF ephemeris table ingest.
//!
//! This module turns the whitespace-separated table produced by the NAIF
//! sub-solar point tool into a date-ordered `TimeSeries`.
//!
//! Design goals:
//! - **Fixed layout** (header rows to skip and column indices are configurable)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **No event detection here**: the calibrator consumes the series

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{ASTRONOMICAL_UNIT_KM, Sample, TableLayout, TimeSeries};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number in the file.
    pub line: usize,
    pub message: String,
}

/// Ingest output: date-ordered series + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSeries {
    pub series: TimeSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedSeries {
    /// Wrap a series that did not come from a table (every sample counts as a
    /// used row).
    pub fn from_series(series: TimeSeries) -> Self {
        let rows = series.len();
        Self {
            series,
            row_errors: Vec::new(),
            rows_read: rows,
            rows_used: rows,
        }
    }
}

/// Load a NAIF table from disk.
pub fn load_naif_table(path: &Path, layout: &TableLayout) -> Result<IngestedSeries, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read NAIF table '{}': {e}", path.display())))?;
    let ingested = parse_naif_table(&text, layout)?;
    debug!(
        path = %path.display(),
        rows_read = ingested.rows_read,
        rows_used = ingested.rows_used,
        "NAIF table loaded"
    );
    Ok(ingested)
}

/// Parse the text of a NAIF table.
pub fn parse_naif_table(text: &str, layout: &TableLayout) -> Result<IngestedSeries, AppError> {
    let mut samples = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, raw) in text.lines().enumerate().skip(layout.skip_rows) {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        rows_read += 1;

        match parse_row(trimmed, &layout.columns) {
            Ok(sample) => samples.push(sample),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = samples.len();
    if rows_used == 0 {
        return Err(AppError::input(format!(
            "No valid rows in the NAIF table ({rows_read} read, {} rejected).",
            row_errors.len()
        )));
    }
    if let Some(first) = row_errors.first() {
        warn!(
            rejected = row_errors.len(),
            first_line = first.line,
            first_error = %first.message,
            "skipped malformed NAIF rows"
        );
    }

    samples.sort_by_key(|s| s.date);
    let series = TimeSeries::new(samples)?;

    Ok(IngestedSeries {
        series,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn parse_row(line: &str, columns: &[usize; 4]) -> Result<Sample, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let field = |idx: usize, name: &str| {
        fields
            .get(idx)
            .copied()
            .ok_or_else(|| format!("missing column {idx} ({name}); row has {} fields", fields.len()))
    };

    let date = parse_date(field(columns[0], "date")?)?;
    let z = parse_km(field(columns[1], "Z")?, "Z")?;
    let r = parse_km(field(columns[2], "R")?, "R")?;
    let d = parse_km(field(columns[3], "D")?, "D")?;

    if r <= 0.0 {
        return Err(format!("sub-point radius must be > 0 km, got {r}"));
    }
    let ratio = z / r;
    if ratio.abs() > 1.0 {
        return Err(format!("sub-solar elevation {z} km exceeds radius {r} km"));
    }
    if d <= 0.0 {
        return Err(format!("sun distance must be > 0 km, got {d}"));
    }

    Ok(Sample {
        date,
        latitude: ratio.asin().to_degrees(),
        distance: d / ASTRONOMICAL_UNIT_KM,
    })
}

/// `YYYY-MM-DD`, optionally followed by a `T...` time of day (ignored).
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let day = s.split_once('T').map_or(s, |(day, _)| day);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn parse_km(s: &str, name: &str) -> Result<f64, String> {
    let v: f64 = s
        .parse()
        .map_err(|e| format!("invalid {name} value '{s}': {e}"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("non-finite {name} value '{s}'"))
    }
}
