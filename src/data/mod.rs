//! Series sources other than the NAIF table (synthetic orbits for demos and tests).

pub mod synthetic;

pub use synthetic::*;
