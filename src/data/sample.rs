//! Deterministic synthetic feeds.
//!
//! Generates a plausible season of daily business history plus a forecast
//! feed with widening confidence bands, optionally dirtied with the defect
//! classes the live analytics feed has produced. Demos and tests get
//! realistic inputs without touching a network.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::{Number, Value, json};

use crate::domain::RawObservation;
use crate::error::EngineError;

/// Sample feed generator settings.
///
/// Equal configs regenerate byte-equal feeds: the RNG is seeded from a
/// digest of every field, so changing any knob changes the stream.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub seed: u64,
    pub history_days: usize,
    pub forecast_days: usize,
    /// Baseline daily revenue (currency units).
    pub base_revenue: f64,
    /// Multiplicative weekend uplift (0.25 = +25% on Sat/Sun).
    pub weekend_uplift: f64,
    /// Geometric day-over-day growth (0.002 = +0.2% per day).
    pub daily_growth: f64,
    /// Log-noise sigma for daily revenue.
    pub noise_sigma: f64,
    /// Fraction of observations dirtied with feed defects, in [0, 1).
    pub defect_rate: f64,
    /// Last day of history; forecasts start the day after.
    pub asof: NaiveDate,
}

impl SampleConfig {
    /// A quarter of history and a month of forecast around `asof`.
    pub fn new(asof: NaiveDate) -> Self {
        Self {
            seed: 7,
            history_days: 90,
            forecast_days: 30,
            base_revenue: 25_000.0,
            weekend_uplift: 0.25,
            daily_growth: 0.002,
            noise_sigma: 0.08,
            defect_rate: 0.0,
            asof,
        }
    }
}

/// A generated pair of raw feeds, shaped exactly like the live endpoint's.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFeed {
    pub historical: Vec<RawObservation>,
    pub predictions: Vec<RawObservation>,
}

/// Generate one deterministic feed pair.
pub fn generate_feed(config: &SampleConfig) -> Result<SampleFeed, EngineError> {
    if config.history_days == 0 {
        return Err(EngineError::InvalidSampleConfig(
            "history_days must be > 0".to_string(),
        ));
    }
    if !(config.base_revenue.is_finite() && config.base_revenue > 0.0) {
        return Err(EngineError::InvalidSampleConfig(
            "base_revenue must be finite and > 0".to_string(),
        ));
    }
    if !(config.weekend_uplift.is_finite() && config.weekend_uplift >= 0.0) {
        return Err(EngineError::InvalidSampleConfig(
            "weekend_uplift must be finite and >= 0".to_string(),
        ));
    }
    if !(config.daily_growth.is_finite() && config.daily_growth > -1.0) {
        return Err(EngineError::InvalidSampleConfig(
            "daily_growth must be finite and > -1".to_string(),
        ));
    }
    if !(config.defect_rate.is_finite() && (0.0..1.0).contains(&config.defect_rate)) {
        return Err(EngineError::InvalidSampleConfig(
            "defect_rate must be in [0, 1)".to_string(),
        ));
    }
    if !(config.noise_sigma.is_finite() && config.noise_sigma >= 0.0) {
        return Err(EngineError::InvalidSampleConfig(
            "noise_sigma must be finite and >= 0".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(feed_seed(config));
    let noise = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| EngineError::InvalidSampleConfig(format!("noise_sigma: {e}")))?;
    // Mean correction so E[exp(noise)] == 1 keeps the baseline unbiased.
    let mean_correction = 0.5 * config.noise_sigma * config.noise_sigma;

    let mut historical = Vec::with_capacity(config.history_days);
    for i in 0..config.history_days {
        let date = config.asof - Duration::days((config.history_days - 1 - i) as i64);
        let level = config.base_revenue
            * (1.0 + config.daily_growth).powi(i as i32)
            * weekend_factor(date, config.weekend_uplift);

        let shock = noise.sample(&mut rng) - mean_correction;
        let revenue = level * shock.exp();
        let aov = rng.gen_range(55.0..95.0);
        let orders = revenue / aov;
        let conversion = rng.gen_range(2.0..3.6);

        let mut observation = RawObservation {
            date: Value::String(date.to_string()),
            revenue: json_number(revenue),
            orders_count: json_number(orders),
            conversion_rate: json_number(conversion),
            avg_order_value: json_number(aov),
            confidence_interval: Value::Null,
            confidence_score: Value::Null,
        };
        maybe_inject_defect(&mut observation, &mut rng, config.defect_rate);
        historical.push(observation);
    }

    let mut predictions = Vec::with_capacity(config.forecast_days);
    for h in 1..=config.forecast_days {
        let date = config.asof + Duration::days(h as i64);
        let level = config.base_revenue
            * (1.0 + config.daily_growth).powi((config.history_days - 1 + h) as i32)
            * weekend_factor(date, config.weekend_uplift);

        // Uncertainty widens with the horizon.
        let band = level * (0.08 + 0.02 * (h as f64).sqrt());
        let orders_mid = level / 75.0;
        let score = (0.95 - 0.01 * h as f64).max(0.5);

        let mut observation = RawObservation {
            date: Value::String(date.to_string()),
            revenue: json_number(level),
            orders_count: json_number(orders_mid),
            conversion_rate: json_number(2.8),
            avg_order_value: json_number(75.0),
            confidence_interval: json!({
                "revenueMin": (level - band).max(0.0),
                "revenueMax": level + band,
                "ordersMin": (orders_mid * 0.8).max(0.0),
                "ordersMax": orders_mid * 1.2,
            }),
            confidence_score: json_number(score),
        };
        maybe_inject_defect(&mut observation, &mut rng, config.defect_rate);
        predictions.push(observation);
    }

    Ok(SampleFeed {
        historical,
        predictions,
    })
}

fn weekend_factor(date: NaiveDate, uplift: f64) -> f64 {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => 1.0 + uplift,
        _ => 1.0,
    }
}

fn json_number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// Dirty an observation with one of the defect classes seen in the live
/// feed, with probability `defect_rate`.
fn maybe_inject_defect(observation: &mut RawObservation, rng: &mut StdRng, defect_rate: f64) {
    if defect_rate <= 0.0 {
        return;
    }
    let roll: f64 = rng.r#gen();
    if roll >= defect_rate {
        return;
    }
    match rng.gen_range(0..6) {
        0 => observation.revenue = Value::String("n/a".to_string()),
        1 => observation.revenue = json_number(-4_200.0),
        2 => observation.orders_count = json_number(5.0e12),
        3 => observation.conversion_rate = Value::String("NaN".to_string()),
        4 => observation.date = Value::Null,
        _ => observation.date = Value::String("pending".to_string()),
    }
}

fn feed_seed(config: &SampleConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.history_days.hash(&mut hasher);
    config.forecast_days.hash(&mut hasher);
    config.base_revenue.to_bits().hash(&mut hasher);
    config.weekend_uplift.to_bits().hash(&mut hasher);
    config.daily_growth.to_bits().hash(&mut hasher);
    config.noise_sigma.to_bits().hash(&mut hasher);
    config.defect_rate.to_bits().hash(&mut hasher);
    config.asof.hash(&mut hasher);
    hasher.finish()
}
