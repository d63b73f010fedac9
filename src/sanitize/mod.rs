//! Observation sanitizer.
//!
//! First stage of the pipeline: one raw observation in, at most one canonical
//! point out.
//!
//! - numeric fields resolve leniently (JSON numbers or numeric strings),
//!   clamp to their ceilings, and round exactly once
//! - a present-but-unparseable date falls back to the caller's as-of date
//! - only a missing or wrong-typed date drops the point
//!
//! Clamping lives here and nowhere else; downstream stages trust their
//! inputs are already canonical.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::domain::{CanonicalPoint, ConfidenceInterval, Provenance, RawObservation};

/// Upper bound for one day of revenue (currency units).
pub const REVENUE_CEILING: f64 = 1_000_000_000.0;
/// Upper bound for one day of orders.
pub const ORDERS_CEILING: f64 = 1_000_000.0;
/// Conversion rate is a percentage.
pub const CONVERSION_CEILING: f64 = 100.0;
/// Upper bound for average order value (currency units).
pub const AOV_CEILING: f64 = 1_000_000.0;

const CURRENCY_DECIMALS: u32 = 2;
const COUNT_DECIMALS: u32 = 0;
const PERCENT_DECIMALS: u32 = 1;

/// Plain-date formats the feed has been seen to produce, tried in order;
/// RFC 3339 timestamps are handled separately.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Sanitize one raw observation into a canonical point.
///
/// Returns `None` only when the date field is missing or not a string. An
/// unparseable date *string* keeps the point with `asof` substituted; a
/// stray point with a wrong-but-present date harms a chart less than a
/// silent gap.
///
/// Confidence metadata is interpreted for predictions only; the historical
/// feed does not carry it.
pub fn sanitize(
    raw: &RawObservation,
    provenance: Provenance,
    asof: NaiveDate,
) -> Option<CanonicalPoint> {
    let date = match &raw.date {
        Value::String(s) => parse_date(s).unwrap_or(asof),
        _ => return None,
    };

    let (confidence_score, confidence_interval) = match provenance {
        Provenance::Historical => (None, None),
        Provenance::Prediction => (
            sanitize_score(&raw.confidence_score),
            sanitize_interval(&raw.confidence_interval),
        ),
    };

    Some(CanonicalPoint {
        date,
        revenue: clamp_metric(&raw.revenue, REVENUE_CEILING, CURRENCY_DECIMALS),
        orders_count: clamp_metric(&raw.orders_count, ORDERS_CEILING, COUNT_DECIMALS),
        conversion_rate: clamp_metric(&raw.conversion_rate, CONVERSION_CEILING, PERCENT_DECIMALS),
        avg_order_value: clamp_metric(&raw.avg_order_value, AOV_CEILING, CURRENCY_DECIMALS),
        provenance,
        confidence_score,
        confidence_interval,
    })
}

/// Resolve a loose feed value to a finite `f64`.
///
/// Accepts JSON numbers and numeric strings (trimmed; `"NaN"`, `"inf"` and
/// friends parse but are rejected as non-finite). Everything else is `None`.
pub fn loose_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Clamp one metric field: unresolvable values become 0, finite values pass
/// through `max(0, min(ceiling, value))`, and the result is rounded once.
fn clamp_metric(value: &Value, ceiling: f64, decimals: u32) -> f64 {
    match loose_f64(value) {
        Some(v) => round_to(v.clamp(0.0, ceiling), decimals),
        None => 0.0,
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A confidence score is optional metadata: an unresolvable value means
/// absent (fabricating a 0 would claim certainty the feed never sent), a
/// finite value clamps into [0, 1].
fn sanitize_score(value: &Value) -> Option<f64> {
    loose_f64(value).map(|v| v.clamp(0.0, 1.0))
}

/// An interval is interpreted only when the feed sent an object; each bound
/// follows the rules of the main field it brackets, missing bounds included.
fn sanitize_interval(value: &Value) -> Option<ConfidenceInterval> {
    let obj = value.as_object()?;
    Some(ConfidenceInterval {
        revenue_min: clamp_bound(obj, "revenueMin", REVENUE_CEILING, CURRENCY_DECIMALS),
        revenue_max: clamp_bound(obj, "revenueMax", REVENUE_CEILING, CURRENCY_DECIMALS),
        orders_min: clamp_bound(obj, "ordersMin", ORDERS_CEILING, COUNT_DECIMALS),
        orders_max: clamp_bound(obj, "ordersMax", ORDERS_CEILING, COUNT_DECIMALS),
    })
}

fn clamp_bound(obj: &Map<String, Value>, key: &str, ceiling: f64, decimals: u32) -> f64 {
    match obj.get(key) {
        Some(v) => clamp_metric(v, ceiling, decimals),
        None => 0.0,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(d);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}
