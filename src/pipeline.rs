//! One-call pipeline over the four stages.
//!
//! Keeping the composition in one place keeps every caller on the same
//! discipline:
//!
//! - sanitize and merge each feed exactly once
//! - statistics come from the full-range merge (the comparison base never
//!   shrinks with the view)
//! - the projection comes from the display-windowed series

use serde::Serialize;
use tracing::debug;

use crate::domain::{EngineOptions, RawObservation, TimeRange};
use crate::project::{ChartProjection, project};
use crate::series::{MergeOptions, MergedSeries, merge};
use crate::stats::{TrendStatistics, compute_statistics};

/// All computed outputs of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// Display series: history windowed to the requested range, forecasts in
    /// full, merge accounting attached.
    pub series: MergedSeries,
    /// Trend snapshot computed from the full history; `None` when the feed
    /// yielded no usable historical points.
    pub statistics: Option<TrendStatistics>,
    /// Renderer hand-off built from the display series.
    pub projection: ChartProjection,
}

/// Execute the full pipeline for one set of feeds and options.
pub fn run(
    historical: &[RawObservation],
    predictions: &[RawObservation],
    options: &EngineOptions,
) -> RunOutput {
    // 1) Sanitize and merge everything once, at full range.
    let full = merge(
        historical,
        predictions,
        &MergeOptions {
            include_predictions: options.include_predictions,
            range: TimeRange::All,
            asof: options.asof,
        },
    );

    // 2) Statistics off the full history, independent of the display range.
    let statistics = compute_statistics(&full);

    // 3) Narrow the history to the display window; forecasts stay whole.
    let series = full.with_history_window(options.range);

    // 4) Project for the requested shape.
    let projection = project(&series, options.chart_type, options.visible_metrics);

    debug!(
        points = series.len(),
        dropped = series.report.dropped_count(),
        chart = options.chart_type.display_name(),
        range = options.range.display_name(),
        "pipeline run complete"
    );

    RunOutput {
        series,
        statistics,
        projection,
    }
}
