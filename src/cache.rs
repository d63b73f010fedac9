//! Last-run memoization for the pipeline.
//!
//! A dashboard re-renders far more often than its inputs change. The cache
//! keys one pipeline run on a 64-bit digest of both raw feeds plus every
//! option, holds the last output, and recomputes only when the key moves.
//! It is a plain value owned by the caller: no locks, no globals, and a
//! single slot, since the UI only ever needs its latest request back.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;
use tracing::trace;

use crate::domain::{EngineOptions, RawObservation};
use crate::pipeline::{RunOutput, run};

/// Memoizing wrapper around [`run`](crate::pipeline::run).
#[derive(Debug, Default)]
pub struct EngineCache {
    key: Option<u64>,
    output: Option<RunOutput>,
}

impl EngineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the pipeline, reusing the previous output when the request digest
    /// matches the last one.
    pub fn run(
        &mut self,
        historical: &[RawObservation],
        predictions: &[RawObservation],
        options: &EngineOptions,
    ) -> &RunOutput {
        let key = request_key(historical, predictions, options);
        if self.key != Some(key) {
            self.key = Some(key);
            self.output = None;
        }
        self.output.get_or_insert_with(|| {
            trace!(key, "engine cache miss, recomputing");
            run(historical, predictions, options)
        })
    }

    /// Drop the cached run.
    pub fn invalidate(&mut self) {
        self.key = None;
        self.output = None;
    }

    /// Whether a cached output is available.
    pub fn is_warm(&self) -> bool {
        self.output.is_some()
    }
}

/// Digest of one full request: every option plus the structural content of
/// both raw feeds, order-sensitive. The key identifies the request as
/// given; it does not try to be smart about equivalent inputs.
fn request_key(
    historical: &[RawObservation],
    predictions: &[RawObservation],
    options: &EngineOptions,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    options.hash(&mut hasher);
    hash_feed(historical, &mut hasher);
    hash_feed(predictions, &mut hasher);
    hasher.finish()
}

fn hash_feed(feed: &[RawObservation], hasher: &mut impl Hasher) {
    feed.len().hash(hasher);
    for observation in feed {
        hash_value(&observation.date, hasher);
        hash_value(&observation.revenue, hasher);
        hash_value(&observation.orders_count, hasher);
        hash_value(&observation.conversion_rate, hasher);
        hash_value(&observation.avg_order_value, hasher);
        hash_value(&observation.confidence_interval, hasher);
        hash_value(&observation.confidence_score, hasher);
    }
}

/// Structural hash over a loose JSON value. Object keys iterate in sorted
/// order under `serde_json`'s default map, so the digest is deterministic.
fn hash_value(value: &Value, hasher: &mut impl Hasher) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        }
        Value::Number(n) => {
            2u8.hash(hasher);
            n.to_string().hash(hasher);
        }
        Value::String(s) => {
            3u8.hash(hasher);
            s.hash(hasher);
        }
        Value::Array(items) => {
            4u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(map) => {
            5u8.hash(hasher);
            map.len().hash(hasher);
            for (k, v) in map {
                k.hash(hasher);
                hash_value(v, hasher);
            }
        }
    }
}
