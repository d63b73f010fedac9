//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded straight off the analytics feed's JSON
//! - passed between pipeline stages without conversion layers
//! - handed to a renderer under the same camelCase wire names the feed uses

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Origin of a point: an observed business day or a forecast.
///
/// The derived order (`Historical < Prediction`) is load-bearing: when a
/// merged series holds an actual and a forecast for the same date, the
/// actual sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Historical,
    Prediction,
}

impl Provenance {
    pub fn display_name(self) -> &'static str {
        match self {
            Provenance::Historical => "historical",
            Provenance::Prediction => "prediction",
        }
    }
}

/// How much trailing history to show alongside the forecast.
///
/// The range only narrows the *displayed* history; trend statistics are
/// always computed from the full history, and forecasts are never clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    All,
    Last7,
    Last30,
}

impl TimeRange {
    /// Number of trailing historical entries to keep, or `None` for all.
    pub fn window_len(self) -> Option<usize> {
        match self {
            TimeRange::All => None,
            TimeRange::Last7 => Some(7),
            TimeRange::Last30 => Some(30),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TimeRange::All => "all",
            TimeRange::Last7 => "last7",
            TimeRange::Last30 => "last30",
        }
    }
}

impl FromStr for TimeRange {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TimeRange::All),
            "last7" => Ok(TimeRange::Last7),
            "last30" => Ok(TimeRange::Last30),
            _ => Err(EngineError::UnknownTimeRange(s.trim().to_string())),
        }
    }
}

/// Chart shape requested by the caller.
///
/// Every shape receives the same canonical series; the shape only decides
/// how many metric series the renderer is told to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Area,
    Bar,
    Stacked,
    Composed,
    Candlestick,
}

impl ChartType {
    /// Maximum number of metric series this shape declares.
    ///
    /// Bars and candlesticks get a primary plus one secondary; the other
    /// shapes can carry every metric.
    pub fn series_capacity(self) -> usize {
        match self {
            ChartType::Bar | ChartType::Candlestick => 2,
            ChartType::Line | ChartType::Area | ChartType::Stacked | ChartType::Composed => 3,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Bar => "bar",
            ChartType::Stacked => "stacked",
            ChartType::Composed => "composed",
            ChartType::Candlestick => "candlestick",
        }
    }
}

impl FromStr for ChartType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "area" => Ok(ChartType::Area),
            "bar" => Ok(ChartType::Bar),
            "stacked" => Ok(ChartType::Stacked),
            "composed" => Ok(ChartType::Composed),
            "candlestick" => Ok(ChartType::Candlestick),
            _ => Err(EngineError::UnknownChartType(s.trim().to_string())),
        }
    }
}

/// One of the three plottable metrics, in declaration priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Revenue,
    Orders,
    Conversion,
}

impl MetricKind {
    /// Declaration priority order used by the projection selector.
    pub const ALL: [MetricKind; 3] = [MetricKind::Revenue, MetricKind::Orders, MetricKind::Conversion];

    /// Wire key the renderer maps to a visual series.
    pub fn series_key(self) -> &'static str {
        match self {
            MetricKind::Revenue => "revenue",
            MetricKind::Orders => "ordersCount",
            MetricKind::Conversion => "conversionRate",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::Revenue => "revenue",
            MetricKind::Orders => "orders",
            MetricKind::Conversion => "conversion",
        }
    }
}

/// Per-metric visibility toggles from the dashboard legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibleMetrics {
    pub revenue: bool,
    pub orders: bool,
    pub conversion: bool,
}

impl VisibleMetrics {
    pub fn is_enabled(self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Revenue => self.revenue,
            MetricKind::Orders => self.orders,
            MetricKind::Conversion => self.conversion,
        }
    }
}

impl Default for VisibleMetrics {
    /// Everything visible until the user narrows the legend.
    fn default() -> Self {
        Self {
            revenue: true,
            orders: true,
            conversion: true,
        }
    }
}

/// A raw observation as received from the analytics endpoint (untrusted).
///
/// The feed is not strict about types: numbers arrive as JSON numbers or as
/// quoted strings, fields go missing, dates show up in several formats. Every
/// payload field is therefore kept as a raw `serde_json::Value` (missing keys
/// default to null) so that decoding an array of these can never fail; the
/// sanitizer decides what each value is worth. The same shape covers both the
/// historical and the predicted feed; the confidence fields are only
/// meaningful on predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    #[serde(default)]
    pub date: Value,
    #[serde(default)]
    pub revenue: Value,
    #[serde(default)]
    pub orders_count: Value,
    #[serde(default)]
    pub conversion_rate: Value,
    #[serde(default)]
    pub avg_order_value: Value,
    #[serde(default)]
    pub confidence_interval: Value,
    #[serde(default)]
    pub confidence_score: Value,
}

/// Sanitized forecast uncertainty band. Bounds follow the same clamping and
/// rounding rules as the main field they bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub revenue_min: f64,
    pub revenue_max: f64,
    pub orders_min: f64,
    pub orders_max: f64,
}

/// A sanitized observation, safe for rendering.
///
/// Guarantees:
///
/// - `date` is a real calendar date (unparseable source dates were replaced
///   with the caller's as-of date rather than dropping the point)
/// - every metric is finite, non-negative, within its ceiling, and already
///   rounded (downstream stages never re-round)
/// - exactly one provenance tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPoint {
    pub date: NaiveDate,
    pub revenue: f64,
    pub orders_count: f64,
    pub conversion_rate: f64,
    pub avg_order_value: f64,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<ConfidenceInterval>,
}

/// A full pipeline run's options as understood by the engine.
///
/// `asof` is the caller's "today": the substitute for unparseable date
/// strings. Threading it through explicitly (instead of reading the wall
/// clock inside the sanitizer) keeps every stage a pure function of its
/// arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    pub include_predictions: bool,
    pub range: TimeRange,
    pub chart_type: ChartType,
    pub visible_metrics: VisibleMetrics,
    pub asof: NaiveDate,
}

impl EngineOptions {
    /// Options with dashboard defaults: line chart, full range, forecasts on,
    /// all metrics visible.
    pub fn new(asof: NaiveDate) -> Self {
        Self {
            include_predictions: true,
            range: TimeRange::All,
            chart_type: ChartType::Line,
            visible_metrics: VisibleMetrics::default(),
            asof,
        }
    }
}
