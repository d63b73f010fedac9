//! Plain-text run summaries.
//!
//! Formatting lives in one place so:
//! - the pipeline stages stay clean and testable
//! - output changes are localized (important for future snapshot tests)
//!
//! Everything returns a `String`; the caller decides where it goes.

use crate::domain::EngineOptions;
use crate::pipeline::RunOutput;
use crate::stats::TrendStatistics;

/// Format the full run summary (view settings + feed accounting + trend).
pub fn format_run_summary(output: &RunOutput, options: &EngineOptions) -> String {
    let mut out = String::new();

    out.push_str("=== chartprep - merged series summary ===\n");
    out.push_str(&format!("As-of: {}\n", options.asof));
    out.push_str(&format!(
        "View: {} chart | range={} | forecasts {}\n",
        options.chart_type.display_name(),
        options.range.display_name(),
        if options.include_predictions { "on" } else { "off" },
    ));
    out.push_str(&format!(
        "Series keys: {}\n",
        if output.projection.visible_series_keys.is_empty() {
            "(none visible)".to_string()
        } else {
            output.projection.visible_series_keys.join(", ")
        }
    ));

    let report = &output.series.report;
    out.push_str(&format!(
        "Points: n={} | history={} | forecast={}\n",
        output.series.len(),
        output.series.historical_points().count(),
        output.series.prediction_points().count(),
    ));
    out.push_str(&format!(
        "Feed: historical {}/{} kept | predictions {}/{} kept\n",
        report.historical_kept,
        report.historical_read,
        report.predictions_kept,
        report.predictions_read,
    ));
    for drop in &report.dropped {
        out.push_str(&format!(
            "  (dropped {}[{}]) {}\n",
            drop.provenance.display_name(),
            drop.index,
            drop.reason,
        ));
    }
    if let Some(date) = output.projection.separator_date {
        out.push_str(&format!("Separator: forecast starts {date}\n"));
    }

    match &output.statistics {
        Some(stats) => out.push_str(&format_statistics(stats)),
        None => out.push_str("\nTrend: unavailable (no historical points)\n"),
    }

    out
}

/// Format the trend block on its own (also embedded in the run summary).
pub fn format_statistics(stats: &TrendStatistics) -> String {
    let mut out = String::new();

    out.push_str("\nTrend (trailing 7 entries vs the 7 before):\n");
    out.push_str(&format!(
        "- revenue   : {:>12.2} vs {:>12.2} ({})\n",
        stats.current_window.revenue,
        stats.prior_window.revenue,
        fmt_pct(stats.percent_change.revenue),
    ));
    out.push_str(&format!(
        "- orders    : {:>12.0} vs {:>12.0} ({})\n",
        stats.current_window.orders,
        stats.prior_window.orders,
        fmt_pct(stats.percent_change.orders),
    ));
    out.push_str(&format!(
        "- conversion: {:>11.1}% vs {:>11.1}% ({})\n",
        stats.current_window.conversion,
        stats.prior_window.conversion,
        fmt_pct(stats.percent_change.conversion),
    ));

    out.push_str("\nForecast window:\n");
    out.push_str(&format!(
        "- revenue sum: {:.2} over {} points\n",
        stats.forecast_window.revenue_sum, stats.forecast_window.point_count,
    ));
    match stats.forecast_window.mean_confidence {
        Some(mean) => out.push_str(&format!("- mean confidence: {mean:.2}\n")),
        None => out.push_str("- mean confidence: n/a\n"),
    }

    out
}

fn fmt_pct(v: f64) -> String {
    format!("{v:+.1}%")
}
