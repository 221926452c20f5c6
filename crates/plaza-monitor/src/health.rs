// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composite health scoring.
//!
//! Health is a weighted blend on a 0-100 scale: success rate carries 40%,
//! latency 30%, and memory pressure 30%. The orchestrator routes new
//! requests straight to templates once the score drops below its
//! configured floor.

use crate::window::WindowStats;

const SUCCESS_WEIGHT: f64 = 40.0;
const LATENCY_WEIGHT: f64 = 30.0;
const MEMORY_WEIGHT: f64 = 30.0;

/// p95 latency at or below this earns the full latency component.
const LATENCY_FULL_MS: f64 = 1_000.0;
/// p95 latency at or above this earns none of it.
const LATENCY_ZERO_MS: f64 = 10_000.0;

/// Blend window aggregates into a health score in [0, 100].
///
/// An empty window scores 100: no traffic is not evidence of trouble.
/// Memory degrades linearly from the configured threshold down to zero
/// at twice the threshold.
pub fn health_score(stats: &WindowStats, memory_threshold_bytes: u64) -> f64 {
    if stats.count == 0 {
        return 100.0;
    }

    let success = stats.success_rate.clamp(0.0, 1.0);

    let p95 = stats.p95_latency_ms as f64;
    let latency = 1.0 - (p95 - LATENCY_FULL_MS) / (LATENCY_ZERO_MS - LATENCY_FULL_MS);
    let latency = latency.clamp(0.0, 1.0);

    let threshold = memory_threshold_bytes.max(1) as f64;
    let memory = 1.0 - (stats.avg_memory_bytes as f64 - threshold) / threshold;
    let memory = memory.clamp(0.0, 1.0);

    success * SUCCESS_WEIGHT + latency * LATENCY_WEIGHT + memory * MEMORY_WEIGHT
}
