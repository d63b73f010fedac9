//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the untrusted feed unit (`RawObservation`) and its sanitized form
//!   (`CanonicalPoint`)
//! - option enums for the pipeline (`TimeRange`, `ChartType`, `MetricKind`)
//! - the per-run options bundle (`EngineOptions`)

pub mod types;

pub use types::*;
