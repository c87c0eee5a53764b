//! Event detection in sampled time series.

pub mod extrema;

pub use extrema::*;
