//! Reporting utilities: formatted terminal output of the orbit model and fit.

pub mod format;

pub use format::*;
