//! Command-line parsing for the Titan solar longitude calculator.
//!
//! The goal of this module is to keep **argument parsing** and **token
//! interpretation** separate from the calibration/solver code. Lenient token
//! handling (skipping malformed numbers) lives here and nowhere else.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser};

use crate::domain::Derivative;
use crate::error::AppError;

/// Environment variable holding the default NAIF table path.
pub const DATA_ENV: &str = "TITAN_LS_DATA";

/// Fallback NAIF table path.
pub const DEFAULT_DATA_PATH: &str = "NAIF-Titan.dat";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "titan-ls",
    version,
    about = "Titan solar longitude (Ls) calculator",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// Tokens processed left to right: `info`, `fit`, `reload` (or `naif`,
    /// `spice`, `load`, `read`, `import`), `demo`, a date `YYYY-MM-DD`, or a
    /// solar longitude `LS[+CYCLE]`.
    #[arg(value_name = "TOKEN")]
    pub tokens: Vec<String>,

    /// NAIF sub-solar point table (default: $TITAN_LS_DATA, else NAIF-Titan.dat).
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Header lines to skip in the NAIF table.
    #[arg(long, default_value_t = 21)]
    pub skip_rows: usize,

    /// Column indices of date, Z, R and D (comma separated).
    #[arg(long, value_delimiter = ',', default_values_t = [0usize, 5, 6, 7])]
    pub columns: Vec<usize>,

    /// Start from a saved model JSON instead of the built-in Titan parameters.
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Save the session model to JSON when all tokens are processed.
    #[arg(long, value_name = "JSON")]
    pub save_model: Option<PathBuf>,

    /// Export the per-sample Ls table of a reloaded (or demo) series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Newton convergence threshold (degrees).
    #[arg(long, default_value_t = 1e-7)]
    pub eps: f64,

    /// Maximum number of Newton steps.
    #[arg(long, default_value_t = 25)]
    pub max_iter: usize,

    /// Newton derivative.
    #[arg(long, value_enum, default_value_t = Derivative::Legacy)]
    pub derivative: Derivative,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// One interpreted positional token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Print the model report.
    Info,
    /// Re-run the harmonic fit and plot it.
    Fit,
    /// Load, calibrate and fit from the NAIF table.
    Reload,
    /// Calibrate and fit from a generated Titan-like series.
    Demo,
    /// Convert a date to Ls.
    Date(NaiveDate),
    /// Convert Ls (in cycle `year_offset`) to a date.
    Longitude { ls: f64, year_offset: i64 },
}

/// Interpret a positional token.
///
/// - `Ok(None)`: malformed numeric token, to be skipped
/// - `Err(_)`: a 10-character token that is not a valid date
pub fn parse_token(raw: &str) -> Result<Option<Token>, AppError> {
    match raw.to_ascii_lowercase().as_str() {
        "info" => return Ok(Some(Token::Info)),
        "fit" => return Ok(Some(Token::Fit)),
        "reload" | "naif" | "spice" | "load" | "read" | "import" => return Ok(Some(Token::Reload)),
        "demo" => return Ok(Some(Token::Demo)),
        _ => {}
    }

    if raw.chars().count() == 10 {
        return parse_date(raw).map(|date| Some(Token::Date(date)));
    }

    Ok(parse_longitude(raw).map(|(ls, year_offset)| Token::Longitude { ls, year_offset }))
}

/// `YYYY-MM-DD` or `YYYY/MM/DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&raw.replace('/', "-"), "%Y-%m-%d")
        .map_err(|e| AppError::input(format!("Invalid date '{raw}' (expected YYYY-MM-DD): {e}")))
}

/// `LS` or `LS+CYCLE`.
fn parse_longitude(raw: &str) -> Option<(f64, i64)> {
    let (ls, year_offset) = match raw.split_once('+') {
        Some((ls, offset)) => (ls.trim().parse::<f64>().ok()?, offset.trim().parse::<i64>().ok()?),
        None => (raw.trim().parse::<f64>().ok()?, 0),
    };
    ls.is_finite().then_some((ls, year_offset))
}
