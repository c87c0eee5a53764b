//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the observed series (`Sample`, `TimeSeries`)
//! - detected events (`ExtremumEvent`, `ExtremumKind`)
//! - the calibrated orbit (`OrbitModel`, `Harmonic`, `SeasonRadii`)
//! - run configuration (`RunConfig`, `SolverConfig`, `CalibrationConfig`)

pub mod types;

pub use types::*;
