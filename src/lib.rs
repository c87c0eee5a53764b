//! `titan-ls` library crate.
//!
//! The binary (`titan-ls`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the calibration and solver modules are reusable on their own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod calib;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod solve;
pub mod track;
