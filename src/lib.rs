//! `chartprep` library crate.
//!
//! The merge-and-sanitize engine behind a sales dashboard's time-series
//! charts. Raw historical observations plus an externally computed forecast
//! feed come in; a cleaned, chronologically ordered series, trend
//! statistics, and a renderer-ready projection come out.
//!
//! The crate is a pure in-process library so that:
//!
//! - every stage is testable without a UI or network in the loop
//! - callers (web backends, desktop shells, notebooks) share one pipeline
//! - dirty feed data can never crash a chart, only shrink it

pub mod cache;
pub mod data;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod sanitize;
pub mod series;
pub mod stats;
