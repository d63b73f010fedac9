//! Series merger.
//!
//! Second stage of the pipeline: runs both raw feeds through the sanitizer,
//! tags provenance, windows the displayed history, and returns one
//! chronologically sorted series.
//!
//! Unsalvageable observations are dropped and accounted for in a
//! `MergeReport`; partial bad data must shrink a chart, never block it.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::{CanonicalPoint, Provenance, RawObservation, TimeRange};
use crate::sanitize::sanitize;

/// Options for one merge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub include_predictions: bool,
    pub range: TimeRange,
    /// The caller's "today"; substitute for unparseable date strings.
    pub asof: NaiveDate,
}

/// One dropped raw observation. Diagnostic data, never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedPoint {
    /// Index into the raw feed array the observation came from.
    pub index: usize,
    pub provenance: Provenance,
    pub reason: String,
}

/// Accounting for one merge: observations read, kept, and dropped per feed.
///
/// A feed that was skipped outright (predictions with the toggle off) counts
/// as zero read: the report reflects work done, not input sizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub historical_read: usize,
    pub historical_kept: usize,
    pub predictions_read: usize,
    pub predictions_kept: usize,
    pub dropped: Vec<DroppedPoint>,
}

impl MergeReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// The merged series: canonical points in date order plus the merge report.
///
/// Ordering invariant: `points[i].date <= points[i + 1].date`, with same-date
/// actuals ahead of forecasts. Duplicate dates are all kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedSeries {
    pub points: Vec<CanonicalPoint>,
    pub report: MergeReport,
}

impl MergedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Observed points, in series order.
    pub fn historical_points(&self) -> impl Iterator<Item = &CanonicalPoint> {
        self.points
            .iter()
            .filter(|p| p.provenance == Provenance::Historical)
    }

    /// Forecast points, in series order.
    pub fn prediction_points(&self) -> impl Iterator<Item = &CanonicalPoint> {
        self.points
            .iter()
            .filter(|p| p.provenance == Provenance::Prediction)
    }

    /// Date of the earliest forecast point, if any.
    pub fn first_prediction_date(&self) -> Option<NaiveDate> {
        self.prediction_points().map(|p| p.date).min()
    }

    /// Copy of this series with the history narrowed to the trailing `range`
    /// entries (trailing in date order). Forecasts are never clipped. The
    /// report carries over unchanged: windowing does not re-sanitize.
    pub fn with_history_window(&self, range: TimeRange) -> MergedSeries {
        let Some(limit) = range.window_len() else {
            return self.clone();
        };
        let total = self.historical_points().count();
        let cut = total.saturating_sub(limit);
        let mut seen = 0usize;
        let points = self
            .points
            .iter()
            .filter(|p| {
                if p.provenance == Provenance::Historical {
                    seen += 1;
                    seen > cut
                } else {
                    true
                }
            })
            .cloned()
            .collect();
        MergedSeries {
            points,
            report: self.report.clone(),
        }
    }
}

/// Merge the two raw feeds into one sorted, provenance-tagged series.
///
/// Every element of both feeds goes through the sanitizer; drops are counted
/// in the report and logged at debug level, never surfaced as errors. With
/// `include_predictions` off the prediction feed is not even sanitized:
/// disabling forecasts must not cost what enabling them costs.
pub fn merge(
    historical: &[RawObservation],
    predictions: &[RawObservation],
    opts: &MergeOptions,
) -> MergedSeries {
    let mut report = MergeReport::default();

    let mut points = sanitize_feed(historical, Provenance::Historical, opts.asof, &mut report);
    if opts.include_predictions {
        points.extend(sanitize_feed(
            predictions,
            Provenance::Prediction,
            opts.asof,
            &mut report,
        ));
    }

    // Stable sort: date ascending, same-date actuals before forecasts.
    points.sort_by(|a, b| a.date.cmp(&b.date).then(a.provenance.cmp(&b.provenance)));

    if !report.dropped.is_empty() {
        debug!(
            dropped = report.dropped.len(),
            historical_kept = report.historical_kept,
            predictions_kept = report.predictions_kept,
            "dropped unsalvageable observations during merge"
        );
    }

    let merged = MergedSeries { points, report };
    merged.with_history_window(opts.range)
}

fn sanitize_feed(
    raw: &[RawObservation],
    provenance: Provenance,
    asof: NaiveDate,
    report: &mut MergeReport,
) -> Vec<CanonicalPoint> {
    let mut points = Vec::with_capacity(raw.len());
    for (index, observation) in raw.iter().enumerate() {
        match sanitize(observation, provenance, asof) {
            Some(point) => points.push(point),
            None => report.dropped.push(DroppedPoint {
                index,
                provenance,
                reason: "date field missing or not a string".to_string(),
            }),
        }
    }
    match provenance {
        Provenance::Historical => {
            report.historical_read = raw.len();
            report.historical_kept = points.len();
        }
        Provenance::Prediction => {
            report.predictions_read = raw.len();
            report.predictions_kept = points.len();
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obs(date: &str, revenue: f64) -> RawObservation {
        serde_json::from_value(json!({"date": date, "revenue": revenue}))
            .expect("test observation must decode")
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn opts(include_predictions: bool, range: TimeRange) -> MergeOptions {
        MergeOptions {
            include_predictions,
            range,
            asof: day(2024, 3, 15),
        }
    }

    /// 1-based day-of-March history builder.
    fn march_history(days: usize) -> Vec<RawObservation> {
        (1..=days)
            .map(|d| obs(&format!("2024-03-{d:02}"), 100.0 * d as f64))
            .collect()
    }

    #[test]
    fn merges_both_feeds_sorted_and_tagged() {
        let historical = vec![obs("2024-03-02", 200.0), obs("2024-03-01", 100.0)];
        let predictions = vec![obs("2024-03-04", 400.0), obs("2024-03-03", 300.0)];

        let merged = merge(&historical, &predictions, &opts(true, TimeRange::All));

        let dates: Vec<NaiveDate> = merged.points.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![day(2024, 3, 1), day(2024, 3, 2), day(2024, 3, 3), day(2024, 3, 4)]
        );
        assert_eq!(merged.historical_points().count(), 2);
        assert_eq!(merged.prediction_points().count(), 2);
        assert_eq!(merged.report.historical_read, 2);
        assert_eq!(merged.report.predictions_kept, 2);
        assert_eq!(merged.report.dropped_count(), 0);
    }

    #[test]
    fn output_is_nondecreasing_for_unordered_input() {
        let historical = vec![
            obs("2024-03-09", 1.0),
            obs("2024-03-02", 2.0),
            obs("2024-03-07", 3.0),
            obs("2024-03-02", 4.0),
            obs("2024-03-11", 5.0),
        ];
        let merged = merge(&historical, &[], &opts(true, TimeRange::All));
        for pair in merged.points.windows(2) {
            assert!(
                pair[0].date <= pair[1].date,
                "series must be date-ordered: {} then {}",
                pair[0].date,
                pair[1].date
            );
        }
        assert_eq!(merged.len(), 5, "duplicate dates are both kept");
    }

    #[test]
    fn same_date_actual_sorts_before_forecast() {
        let historical = vec![obs("2024-03-05", 500.0)];
        let predictions = vec![obs("2024-03-05", 480.0), obs("2024-03-04", 450.0)];

        let merged = merge(&historical, &predictions, &opts(true, TimeRange::All));

        assert_eq!(merged.points[0].provenance, Provenance::Prediction);
        assert_eq!(merged.points[0].date, day(2024, 3, 4));
        assert_eq!(
            merged.points[1].provenance,
            Provenance::Historical,
            "same-date actual renders first"
        );
        assert_eq!(merged.points[2].provenance, Provenance::Prediction);
    }

    #[test]
    fn mixed_batch_drops_only_the_dateless_point() {
        // Five observations; the third has garbage revenue (kept, zeroed),
        // the fourth has no date at all (dropped).
        let historical = vec![
            obs("2024-03-01", 100.0),
            obs("2024-03-02", 200.0),
            serde_json::from_value(json!({"date": "2024-03-03", "revenue": "abc"})).unwrap(),
            serde_json::from_value(json!({"revenue": 400.0})).unwrap(),
            obs("2024-03-05", 500.0),
        ];

        let merged = merge(&historical, &[], &opts(true, TimeRange::All));

        assert_eq!(merged.len(), 4, "exactly one point dropped");
        assert_eq!(merged.points[2].date, day(2024, 3, 3));
        assert_eq!(merged.points[2].revenue, 0.0, "garbage revenue sanitized to 0");
        assert_eq!(merged.report.historical_read, 5);
        assert_eq!(merged.report.historical_kept, 4);
        assert_eq!(merged.report.dropped_count(), 1);
        assert_eq!(merged.report.dropped[0].index, 3);
        assert_eq!(merged.report.dropped[0].provenance, Provenance::Historical);
    }

    #[test]
    fn disabled_predictions_are_not_sanitized_at_all() {
        let historical = vec![obs("2024-03-01", 100.0)];
        let predictions = vec![obs("2024-03-02", 200.0), obs("2024-03-03", 300.0)];

        let merged = merge(&historical, &predictions, &opts(false, TimeRange::All));

        assert_eq!(merged.prediction_points().count(), 0);
        assert_eq!(merged.first_prediction_date(), None);
        assert_eq!(
            merged.report.predictions_read, 0,
            "a skipped feed does no work, so the report shows none"
        );
    }

    #[test]
    fn range_clips_trailing_history_only() {
        let historical = march_history(20);
        let predictions = vec![obs("2024-03-21", 1.0), obs("2024-03-22", 2.0)];

        let merged = merge(&historical, &predictions, &opts(true, TimeRange::Last7));

        assert_eq!(merged.historical_points().count(), 7);
        assert_eq!(
            merged.historical_points().next().map(|p| p.date),
            Some(day(2024, 3, 14)),
            "the trailing seven days of March start on the 14th"
        );
        assert_eq!(merged.prediction_points().count(), 2, "forecasts are never clipped");
    }

    #[test]
    fn trailing_window_follows_date_order_not_arrival_order() {
        // Newest entry arrives first; the window must still keep the newest
        // dates, not the first array elements.
        let mut historical = march_history(10);
        historical.reverse();

        let merged = merge(&historical, &[], &opts(true, TimeRange::Last7));

        let dates: Vec<NaiveDate> = merged.points.iter().map(|p| p.date).collect();
        let expected: Vec<NaiveDate> = (4..=10).map(|d| day(2024, 3, d)).collect();
        assert_eq!(dates, expected);
    }

    #[test]
    fn windowing_a_short_history_keeps_everything() {
        let merged = merge(&march_history(3), &[], &opts(true, TimeRange::Last30));
        assert_eq!(merged.historical_points().count(), 3);
    }

    #[test]
    fn range_all_windowing_is_identity() {
        let merged = merge(&march_history(5), &[], &opts(true, TimeRange::All));
        let rewindowed = merged.with_history_window(TimeRange::All);
        assert_eq!(rewindowed, merged);
    }

    #[test]
    fn empty_feeds_merge_to_an_empty_series() {
        let merged = merge(&[], &[], &opts(true, TimeRange::Last7));
        assert!(merged.is_empty());
        assert_eq!(merged.report, MergeReport::default());
    }
}
