//! Projection selector.
//!
//! Fourth stage of the pipeline: turns the merged series plus the requested
//! chart shape and legend toggles into the renderer hand-off.
//!
//! The data is never filtered or resampled here: every shape draws the same
//! numbers, only the declared series keys differ. That single rule is what
//! keeps "switching chart type changed my numbers" impossible.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{CanonicalPoint, ChartType, MetricKind, VisibleMetrics};
use crate::series::MergedSeries;

/// Renderer hand-off: the canonical data, which metric series to draw, and
/// where to draw the history/forecast boundary marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartProjection {
    pub data: Vec<CanonicalPoint>,
    pub visible_series_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator_date: Option<NaiveDate>,
}

/// Project the merged series for one chart shape.
///
/// `data` is the series verbatim. `visible_series_keys` lists the enabled
/// metrics in priority order (revenue, orders, conversion), truncated to the
/// shape's series capacity. An empty key list next to non-empty data is
/// legitimate; deciding "there is nothing to show" belongs to the caller,
/// never to this stage.
pub fn project(
    merged: &MergedSeries,
    chart_type: ChartType,
    visible_metrics: VisibleMetrics,
) -> ChartProjection {
    let visible_series_keys = MetricKind::ALL
        .iter()
        .copied()
        .filter(|kind| visible_metrics.is_enabled(*kind))
        .take(chart_type.series_capacity())
        .map(|kind| kind.series_key().to_string())
        .collect();

    ChartProjection {
        data: merged.points.clone(),
        visible_series_keys,
        separator_date: merged.first_prediction_date(),
    }
}
