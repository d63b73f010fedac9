//! Synthetic data helpers.
//!
//! - deterministic sample feeds for demos and tests (`sample`)

pub mod sample;

pub use sample::*;
