//! Orbit calibration: event detection and derived orbit parameters.

pub mod calibrator;

pub use calibrator::*;
