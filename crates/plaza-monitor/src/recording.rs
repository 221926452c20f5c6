// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any recorder (Prometheus, statsd, etc.)
//! can collect these metrics.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Plaza metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("plaza_requests_total", "Total pipeline requests by source");
    describe_counter!("plaza_cache_hits_total", "Response cache hits");
    describe_counter!("plaza_cache_misses_total", "Response cache misses");
    describe_counter!("plaza_blocked_total", "Requests blocked by the inbound safety gate");
    describe_counter!("plaza_retries_total", "Generation retry attempts");
    describe_gauge!("plaza_health_score", "Composite pipeline health score (0-100)");
    describe_gauge!("plaza_pool_available_permits", "Free backend connection permits");
    describe_histogram!(
        "plaza_generation_latency_seconds",
        "Backend generation latency in seconds"
    );
    describe_histogram!(
        "plaza_validation_latency_seconds",
        "Risk validation latency in seconds"
    );
}

/// Record a completed request by its response source.
pub fn record_request(source: &str) {
    metrics::counter!("plaza_requests_total", "source" => source.to_string()).increment(1);
}

/// Record a cache lookup outcome.
pub fn record_cache_lookup(hit: bool) {
    if hit {
        metrics::counter!("plaza_cache_hits_total").increment(1);
    } else {
        metrics::counter!("plaza_cache_misses_total").increment(1);
    }
}

/// Record a blocked inbound message.
pub fn record_blocked() {
    metrics::counter!("plaza_blocked_total").increment(1);
}

/// Record a generation retry.
pub fn record_retry() {
    metrics::counter!("plaza_retries_total").increment(1);
}

/// Set the current composite health score.
pub fn set_health_score(score: f64) {
    metrics::gauge!("plaza_health_score").set(score);
}

/// Set the number of free backend pool permits.
pub fn set_pool_available(permits: f64) {
    metrics::gauge!("plaza_pool_available_permits").set(permits);
}

/// Record backend generation latency.
pub fn record_generation_latency(seconds: f64) {
    metrics::histogram!("plaza_generation_latency_seconds").record(seconds);
}

/// Record risk validation latency.
pub fn record_validation_latency(seconds: f64) {
    metrics::histogram!("plaza_validation_latency_seconds").record(seconds);
}
