//! Crate error type.
//!
//! Only broken *call contracts* produce an error: an option string that names
//! no known enum variant, or a nonsensical sample-feed config. Dirty feed
//! data never does; the sanitizer clamps or drops it instead, so the
//! pipeline stages themselves are infallible.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown chart type '{0}' (expected one of: line, area, bar, stacked, composed, candlestick)")]
    UnknownChartType(String),

    #[error("unknown time range '{0}' (expected one of: all, last7, last30)")]
    UnknownTimeRange(String),

    #[error("invalid sample config: {0}")]
    InvalidSampleConfig(String),
}
