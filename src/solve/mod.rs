//! Date <-> solar longitude conversion on a calibrated orbit model.
//!
//! - date -> Ls: Newton iteration on the harmonic correction
//! - Ls -> date: closed form, rounded to whole days

pub mod solver;

pub use solver::*;
