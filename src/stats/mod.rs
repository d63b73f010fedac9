//! Trend statistics.
//!
//! Third stage of the pipeline: compares the trailing week of history
//! against the week before it and aggregates the forecast horizon.
//!
//! The windows slice whatever series they are given; callers that applied a
//! display range must still pass the full-range merge here, so the
//! comparison base never shrinks with the view (the pipeline does exactly
//! that).

use serde::Serialize;

use crate::domain::CanonicalPoint;
use crate::series::MergedSeries;

/// Length of the current/prior comparison windows (entries).
pub const TREND_WINDOW_LEN: usize = 7;
/// Forecast horizon: at most this many prediction points are aggregated.
pub const FORECAST_WINDOW_LEN: usize = 30;

/// Aggregate of one comparison window: revenue and orders are sums,
/// conversion is a mean (summing rates means nothing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowAggregate {
    pub revenue: f64,
    pub orders: f64,
    pub conversion: f64,
}

/// Week-over-week change per metric, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentChange {
    pub revenue: f64,
    pub orders: f64,
    pub conversion: f64,
}

/// Forward-looking aggregate over the forecast horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastWindow {
    pub revenue_sum: f64,
    pub point_count: usize,
    /// Mean confidence score across counted points that carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_confidence: Option<f64>,
}

/// Derived, read-only trend snapshot. Recomputed whole on every input
/// change, never patched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStatistics {
    pub current_window: WindowAggregate,
    pub prior_window: WindowAggregate,
    pub percent_change: PercentChange,
    pub forecast_window: ForecastWindow,
}

/// Compute the trend snapshot for a merged series.
///
/// Returns `None` when the series has no historical points: statistics need
/// at least one real observation. Fewer than 14 historical points shrink the
/// windows (the prior window takes what remains and may be empty).
pub fn compute_statistics(merged: &MergedSeries) -> Option<TrendStatistics> {
    let history: Vec<&CanonicalPoint> = merged.historical_points().collect();
    if history.is_empty() {
        return None;
    }

    let n = history.len();
    let current = &history[n.saturating_sub(TREND_WINDOW_LEN)..];
    let prior = &history[n.saturating_sub(2 * TREND_WINDOW_LEN)..n.saturating_sub(TREND_WINDOW_LEN)];

    let current_window = aggregate_window(current);
    let prior_window = aggregate_window(prior);
    let percent_change = PercentChange {
        revenue: pct_change(current_window.revenue, prior_window.revenue),
        orders: pct_change(current_window.orders, prior_window.orders),
        conversion: pct_change(current_window.conversion, prior_window.conversion),
    };

    Some(TrendStatistics {
        current_window,
        prior_window,
        percent_change,
        forecast_window: forecast_window(merged),
    })
}

fn aggregate_window(points: &[&CanonicalPoint]) -> WindowAggregate {
    if points.is_empty() {
        return WindowAggregate::default();
    }
    let mut revenue = 0.0;
    let mut orders = 0.0;
    let mut conversion = 0.0;
    for p in points {
        revenue += p.revenue;
        orders += p.orders_count;
        conversion += p.conversion_rate;
    }
    WindowAggregate {
        revenue,
        orders,
        conversion: conversion / points.len() as f64,
    }
}

/// `(current - prior) / prior * 100`, defined as 0 when `prior` is 0: "no
/// baseline" is not a growth rate, and +inf would poison every consumer.
fn pct_change(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        return 0.0;
    }
    (current - prior) / prior * 100.0
}

/// Sum revenue over up to the first [`FORECAST_WINDOW_LEN`] forecast points
/// in date order. Forecasts are a fixed forward horizon, untouched by the
/// historical display range.
fn forecast_window(merged: &MergedSeries) -> ForecastWindow {
    let mut revenue_sum = 0.0;
    let mut point_count = 0usize;
    let mut confidence_sum = 0.0;
    let mut confidence_count = 0usize;

    for p in merged.prediction_points().take(FORECAST_WINDOW_LEN) {
        revenue_sum += p.revenue;
        point_count += 1;
        if let Some(score) = p.confidence_score {
            confidence_sum += score;
            confidence_count += 1;
        }
    }

    let mean_confidence = if confidence_count > 0 {
        Some(confidence_sum / confidence_count as f64)
    } else {
        None
    };

    ForecastWindow {
        revenue_sum,
        point_count,
        mean_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Provenance;
    use crate::series::MergeReport;
    use chrono::NaiveDate;

    fn day_of_march(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn point(d: u32, revenue: f64, orders: f64, conversion: f64, provenance: Provenance) -> CanonicalPoint {
        CanonicalPoint {
            date: day_of_march(d),
            revenue,
            orders_count: orders,
            conversion_rate: conversion,
            avg_order_value: 0.0,
            provenance,
            confidence_score: None,
            confidence_interval: None,
        }
    }

    fn series(points: Vec<CanonicalPoint>) -> MergedSeries {
        MergedSeries {
            points,
            report: MergeReport::default(),
        }
    }

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "{what}: expected {expected}, got {actual}"
        );
    }

    #[test]
    fn no_history_means_no_statistics() {
        assert_eq!(compute_statistics(&MergedSeries::default()), None);

        let forecasts_only = series(vec![point(20, 100.0, 1.0, 1.0, Provenance::Prediction)]);
        assert_eq!(
            compute_statistics(&forecasts_only),
            None,
            "forecasts alone cannot anchor a trend"
        );
    }

    #[test]
    fn fourteen_days_split_into_current_and_prior_week() {
        let mut points = Vec::new();
        for d in 1..=7 {
            points.push(point(d, 100.0, 10.0, 2.0, Provenance::Historical));
        }
        for d in 8..=14 {
            points.push(point(d, 200.0, 30.0, 4.0, Provenance::Historical));
        }

        let stats = compute_statistics(&series(points)).expect("history present");

        assert_close(stats.prior_window.revenue, 700.0, "prior revenue sum");
        assert_close(stats.current_window.revenue, 1400.0, "current revenue sum");
        assert_close(stats.prior_window.orders, 70.0, "prior orders sum");
        assert_close(stats.current_window.orders, 210.0, "current orders sum");
        assert_close(stats.prior_window.conversion, 2.0, "conversion is a mean, not a sum");
        assert_close(stats.current_window.conversion, 4.0, "conversion is a mean, not a sum");
        assert_close(stats.percent_change.revenue, 100.0, "revenue change");
        assert_close(stats.percent_change.orders, 200.0, "orders change");
        assert_close(stats.percent_change.conversion, 100.0, "conversion change");
    }

    #[test]
    fn windows_slice_the_trailing_fourteen_of_longer_history() {
        let points: Vec<CanonicalPoint> = (1..=20)
            .map(|d| point(d, 10.0 * d as f64, 0.0, 0.0, Provenance::Historical))
            .collect();

        let stats = compute_statistics(&series(points)).unwrap();

        // Days 14..=20 and 7..=13.
        assert_close(stats.current_window.revenue, 1190.0, "current window sum");
        assert_close(stats.prior_window.revenue, 700.0, "prior window sum");
        assert_close(stats.percent_change.revenue, 70.0, "week-over-week change");
    }

    #[test]
    fn short_history_shrinks_the_prior_window() {
        let points: Vec<CanonicalPoint> = (1..=10)
            .map(|d| point(d, 100.0, 0.0, 0.0, Provenance::Historical))
            .collect();

        let stats = compute_statistics(&series(points)).unwrap();

        assert_close(stats.current_window.revenue, 700.0, "current takes the last 7");
        assert_close(stats.prior_window.revenue, 300.0, "prior takes the remaining 3");
    }

    #[test]
    fn single_observation_still_produces_statistics() {
        let stats = compute_statistics(&series(vec![point(1, 42.0, 2.0, 1.5, Provenance::Historical)]))
            .expect("one observation is enough");
        assert_close(stats.current_window.revenue, 42.0, "current window");
        assert_eq!(stats.prior_window, WindowAggregate::default());
        assert_eq!(stats.percent_change.revenue, 0.0, "empty prior means 0% by policy");
    }

    #[test]
    fn zero_prior_baseline_reports_zero_percent_change() {
        let mut points = Vec::new();
        for d in 1..=7 {
            points.push(point(d, 0.0, 0.0, 0.0, Provenance::Historical));
        }
        for d in 8..=14 {
            points.push(point(d, 500.0 / 7.0, 0.0, 0.0, Provenance::Historical));
        }

        let stats = compute_statistics(&series(points)).unwrap();

        assert_eq!(stats.prior_window.revenue, 0.0);
        assert!(stats.current_window.revenue > 0.0);
        assert_eq!(stats.percent_change.revenue, 0.0, "0 -> 500 is reported as 0%, not infinity");
        assert!(stats.percent_change.revenue.is_finite());
    }

    #[test]
    fn forecast_window_caps_at_thirty_points_in_date_order() {
        let mut points = vec![point(1, 100.0, 0.0, 0.0, Provenance::Historical)];
        // 40 forecast points; only the first 30 by date may count.
        for i in 0..40u32 {
            let mut p = point(1, 10.0, 0.0, 0.0, Provenance::Prediction);
            p.date = day_of_march(1) + chrono::Duration::days(1 + i as i64);
            if i >= 30 {
                p.revenue = 1000.0;
            }
            points.push(p);
        }

        let stats = compute_statistics(&series(points)).unwrap();

        assert_eq!(stats.forecast_window.point_count, 30);
        assert_close(
            stats.forecast_window.revenue_sum,
            300.0,
            "only the first 30 forecast points count",
        );
    }

    #[test]
    fn mean_confidence_averages_only_present_scores() {
        let mut points = vec![point(1, 100.0, 0.0, 0.0, Provenance::Historical)];
        let mut a = point(2, 10.0, 0.0, 0.0, Provenance::Prediction);
        a.confidence_score = Some(0.9);
        let mut b = point(3, 10.0, 0.0, 0.0, Provenance::Prediction);
        b.confidence_score = Some(0.7);
        let c = point(4, 10.0, 0.0, 0.0, Provenance::Prediction);
        points.extend([a, b, c]);

        let stats = compute_statistics(&series(points)).unwrap();
        let mean = stats.forecast_window.mean_confidence.expect("two scores present");
        assert_close(mean, 0.8, "mean of 0.9 and 0.7");

        let unscored = series(vec![
            point(1, 100.0, 0.0, 0.0, Provenance::Historical),
            point(2, 10.0, 0.0, 0.0, Provenance::Prediction),
        ]);
        assert_eq!(
            compute_statistics(&unscored).unwrap().forecast_window.mean_confidence,
            None,
            "no scores, no mean"
        );
    }
}
