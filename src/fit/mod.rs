//! Harmonic correction fitting.
//!
//! Responsibilities:
//!
//! - derive the `(Ls, dLs)` calibration points from the orbit model
//! - generate the phase grid and evaluate each phase candidate (parallel)
//! - refine the best phase and store the coefficients in the model

pub mod fitter;
pub mod phase_grid;

pub use fitter::*;
pub use phase_grid::*;
