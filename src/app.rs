//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments into a `RunConfig`
//! - owns the session orbit model
//! - dispatches positional tokens (report, fit plot, reload, demo, conversions)
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, error, info, warn};

use crate::cli::{Cli, DATA_ENV, DEFAULT_DATA_PATH, Token, parse_token};
use crate::data::SyntheticOrbit;
use crate::domain::{CalibrationConfig, OrbitModel, RunConfig, SolverConfig, TableLayout};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `titan-ls` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    let config = run_config_from_cli(&cli)?;
    let mut session = Session::new(config)?;
    session.run_tokens(&cli.tokens)
}

/// Resolve CLI flags (plus environment and defaults) into a `RunConfig`.
pub fn run_config_from_cli(cli: &Cli) -> Result<RunConfig, AppError> {
    let columns: [usize; 4] = cli.columns.as_slice().try_into().map_err(|_| {
        AppError::input(format!(
            "--columns needs exactly 4 indices (date, Z, R, D), got {}.",
            cli.columns.len()
        ))
    })?;
    if !(cli.eps.is_finite() && cli.eps > 0.0) {
        return Err(AppError::input(format!("--eps must be a positive number, got {}.", cli.eps)));
    }
    if cli.max_iter == 0 {
        return Err(AppError::input("--max-iter must be at least 1."));
    }

    let data_path = cli
        .data
        .clone()
        .or_else(|| std::env::var_os(DATA_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

    Ok(RunConfig {
        data_path,
        layout: TableLayout {
            skip_rows: cli.skip_rows,
            columns,
        },
        model_path: cli.model.clone(),
        save_model: cli.save_model.clone(),
        export: cli.export.clone(),
        calibration: CalibrationConfig::default(),
        solver: SolverConfig {
            eps: cli.eps,
            max_iter: cli.max_iter,
            derivative: cli.derivative,
        },
        plot_width: cli.width,
        plot_height: cli.height,
    })
}

/// One CLI session: a model value threaded through the token list.
#[derive(Debug, Clone)]
pub struct Session {
    config: RunConfig,
    model: OrbitModel,
}

impl Session {
    /// Start from the saved model when one is configured, else the built-in
    /// Titan parameters.
    pub fn new(config: RunConfig) -> Result<Self, AppError> {
        let model = match &config.model_path {
            Some(path) => crate::io::model_file::read_model_json(path)?,
            None => OrbitModel::default(),
        };
        Ok(Self { config, model })
    }

    pub fn model(&self) -> &OrbitModel {
        &self.model
    }

    /// Process every token, print results to stdout, then save the model if
    /// requested.
    ///
    /// A failing token does not stop the session; the first failure is
    /// returned once all tokens have been processed.
    pub fn run_tokens(&mut self, tokens: &[String]) -> Result<(), AppError> {
        let mut first_error: Option<AppError> = None;

        if tokens.is_empty() {
            println!("{}", crate::report::format_model_report(&self.model));
        }
        for raw in tokens {
            match self.handle(raw) {
                Ok(Some(output)) => println!("{output}"),
                Ok(None) => {}
                // The first failure is reported by the caller.
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => error!(token = %raw, "{err}"),
            }
        }

        if let Some(path) = &self.config.save_model {
            crate::io::model_file::write_model_json(path, &self.model)?;
            info!(path = %path.display(), "model saved");
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Evaluate one token and return the text to print, if any.
    pub fn handle(&mut self, raw: &str) -> Result<Option<String>, AppError> {
        let Some(token) = parse_token(raw)? else {
            debug!(token = %raw, "skipping unrecognised token");
            return Ok(None);
        };

        match token {
            Token::Info => Ok(Some(crate::report::format_model_report(&self.model))),
            Token::Fit => self.refit().map(Some),
            Token::Reload => {
                let run = pipeline::run_calibration(&self.config)?;
                self.adopt(run).map(Some)
            }
            Token::Demo => {
                let run = pipeline::run_synthetic(&SyntheticOrbit::titan_like(), &self.config.calibration)?;
                self.adopt(run).map(Some)
            }
            Token::Date(date) => {
                let ls = crate::solve::solve_longitude(&self.model, date, &self.config.solver)?;
                Ok(Some(format!("Ls: {ls:.2}")))
            }
            Token::Longitude { ls, year_offset } => {
                let date = crate::solve::solve_date(&self.model, ls, year_offset)?;
                Ok(Some(format!("Date: {date}")))
            }
        }
    }

    fn refit(&mut self) -> Result<String, AppError> {
        let fit = crate::fit::fit_ls(&mut self.model)?;
        let mut out = crate::plot::render_fit_plot(&fit, self.config.plot_width, self.config.plot_height);
        out.push('\n');
        out.push_str(&crate::report::format_fit_points(&fit));
        Ok(out)
    }

    /// Make a fresh calibration the session model, export its series if
    /// requested, and report it.
    fn adopt(&mut self, run: pipeline::CalibrationRun) -> Result<String, AppError> {
        if !run.ingest.row_errors.is_empty() {
            warn!(
                rejected = run.ingest.row_errors.len(),
                read = run.ingest.rows_read,
                "NAIF rows rejected during reload"
            );
        }
        self.model = run.model;

        if let Some(path) = &self.config.export {
            let rows =
                crate::io::export::write_ls_csv(path, &run.ingest.series, &self.model, &self.config.solver)?;
            info!(path = %path.display(), rows, "Ls table exported");
        }

        Ok(crate::report::format_model_report(&self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ymd;
    use crate::error::ErrorKind;

    fn session() -> Session {
        let cli = Cli::try_parse_from(["titan-ls"]).unwrap();
        Session::new(run_config_from_cli(&cli).unwrap()).unwrap()
    }

    #[test]
    fn conversions_use_the_session_model() {
        let mut s = session();
        assert_eq!(s.handle("1987-11-25").unwrap().unwrap(), "Ls: 90.00");
        assert_eq!(s.handle("2009/07/30").unwrap().unwrap(), "Ls: 0.00");
        assert_eq!(s.handle("90").unwrap().unwrap(), "Date: 1987-11-25");
        assert_eq!(s.handle("0+1").unwrap().unwrap(), "Date: 2009-07-30");
        assert_eq!(s.handle("garbage").unwrap(), None);
    }

    #[test]
    fn info_and_fit_render_text() {
        let mut s = session();
        assert!(s.handle("info").unwrap().unwrap().contains("Equinox  (V): 1980-02-22"));
        let plot = s.handle("fit").unwrap().unwrap();
        assert!(plot.starts_with("Plot: Ls=[0, 360] deg"));
        assert!(s.model().harmonic.is_within_bounds());
    }

    #[test]
    fn failures_do_not_stop_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("model.json");
        let cli = Cli::try_parse_from([
            "titan-ls",
            "--data",
            dir.path().join("missing.dat").to_str().unwrap(),
            "--save-model",
            saved.to_str().unwrap(),
        ])
        .unwrap();
        let mut s = Session::new(run_config_from_cli(&cli).unwrap()).unwrap();

        let tokens: Vec<String> = ["2009-13-01", "reload", "90"].iter().map(|t| t.to_string()).collect();
        let err = s.run_tokens(&tokens).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(saved.exists());
        assert_eq!(s.model().vernal_equinoxes[0], ymd(1980, 2, 22));
    }

    #[test]
    fn demo_replaces_the_model_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("ls.csv");
        let cli = Cli::try_parse_from(["titan-ls", "--export", csv.to_str().unwrap()]).unwrap();
        let mut s = Session::new(run_config_from_cli(&cli).unwrap()).unwrap();

        let report = s.handle("demo").unwrap().unwrap();
        assert!(report.contains("Equinox  (V): 1980-02-22 | 2009-07-30"), "{report}");
        assert_eq!(s.model().orbit_days, 10751);
        assert_eq!(s.model().summer_solstices[0], ymd(1987, 7, 3));

        let text = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(text.lines().count(), 1 + 2 * 10751);
        assert!(text.lines().nth(1).unwrap().starts_with("1980-02-22,0.000000,"));
    }

    #[test]
    fn rejects_bad_column_count() {
        let cli = Cli::try_parse_from(["titan-ls", "--columns", "0,1,2"]).unwrap();
        assert_eq!(run_config_from_cli(&cli).unwrap_err().kind(), ErrorKind::Input);
    }

    #[test]
    fn loads_a_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = OrbitModel {
            orbit_days: 10750,
            ..OrbitModel::default()
        };
        crate::io::model_file::write_model_json(&path, &model).unwrap();

        let cli = Cli::try_parse_from(["titan-ls", "--model", path.to_str().unwrap()]).unwrap();
        let s = Session::new(run_config_from_cli(&cli).unwrap()).unwrap();
        assert_eq!(s.model().orbit_days, 10750);
    }
}
