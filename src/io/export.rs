//! Export the per-sample solar longitude table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{OrbitModel, SolverConfig, TimeSeries};
use crate::error::AppError;
use crate::solve::solve_longitude;

/// Write `date,latitude_deg,distance_au,ls_deg` for every sample of `series`.
///
/// Every row is solved before the file is created, so a sample that fails to
/// converge leaves no partial export behind. Returns the number of rows written.
pub fn write_ls_csv(
    path: &Path,
    series: &TimeSeries,
    model: &OrbitModel,
    solver: &SolverConfig,
) -> Result<usize, AppError> {
    let rows = series
        .samples()
        .iter()
        .map(|s| {
            let ls = solve_longitude(model, s.date, solver)?;
            Ok(format!("{},{:.6},{:.10},{:.6}", s.date, s.latitude, s.distance, ls))
        })
        .collect::<Result<Vec<String>, AppError>>()?;

    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "date,latitude_deg,distance_au,ls_deg")
        .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;
    for row in &rows {
        writeln!(out, "{row}").map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;

    Ok(rows.len())
}
