//! Terminal plotting of the harmonic fit.

pub mod ascii;

pub use ascii::*;
