// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ring-buffer sample retention and rolling-window aggregates.

use std::collections::VecDeque;
use std::time::Duration;

use plaza_core::ResponseSource;
use tokio::time::Instant;

/// One completed request as observed by the monitor.
#[derive(Debug, Clone)]
pub struct PerformanceSample {
    pub at: Instant,
    pub latency_ms: u64,
    pub success: bool,
    pub memory_bytes: u64,
    /// `None` when the request never consulted the cache (blocked or
    /// template-only paths).
    pub cache_hit: Option<bool>,
    pub source: ResponseSource,
}

impl PerformanceSample {
    pub fn new(latency_ms: u64, success: bool, source: ResponseSource) -> Self {
        Self {
            at: Instant::now(),
            latency_ms,
            success,
            memory_bytes: 0,
            cache_hit: None,
            source,
        }
    }

    pub fn with_cache_hit(mut self, hit: bool) -> Self {
        self.cache_hit = Some(hit);
        self
    }

    pub fn with_memory_bytes(mut self, bytes: u64) -> Self {
        self.memory_bytes = bytes;
        self
    }
}

/// Aggregates over one rolling window.
#[derive(Debug, Clone, Default)]
pub struct WindowStats {
    pub count: usize,
    /// Fraction of samples in [0, 1] that completed successfully.
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
    /// Hit fraction among samples that consulted the cache; 0 when none
    /// did.
    pub cache_hit_rate: f64,
    pub avg_memory_bytes: u64,
    pub generated: usize,
    pub template: usize,
    pub blocked: usize,
}

/// Fixed-capacity ring buffer of samples, oldest evicted first.
#[derive(Debug)]
pub struct SampleWindow {
    samples: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: PerformanceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Aggregate the samples newer than `window` ago.
    pub fn stats(&self, window: Duration) -> WindowStats {
        let now = Instant::now();
        let cutoff = now.checked_sub(window);

        let in_window: Vec<&PerformanceSample> = self
            .samples
            .iter()
            .filter(|s| match cutoff {
                Some(cutoff) => s.at >= cutoff,
                // The window reaches past the start of the clock: everything
                // qualifies.
                None => true,
            })
            .collect();

        if in_window.is_empty() {
            return WindowStats::default();
        }

        let count = in_window.len();
        let successes = in_window.iter().filter(|s| s.success).count();
        let total_latency: u64 = in_window.iter().map(|s| s.latency_ms).sum();
        let total_memory: u64 = in_window.iter().map(|s| s.memory_bytes).sum();

        let mut latencies: Vec<u64> = in_window.iter().map(|s| s.latency_ms).collect();
        latencies.sort_unstable();

        let cache_samples = in_window.iter().filter(|s| s.cache_hit.is_some()).count();
        let cache_hits = in_window
            .iter()
            .filter(|s| s.cache_hit == Some(true))
            .count();

        let mut generated = 0;
        let mut template = 0;
        let mut blocked = 0;
        for s in &in_window {
            match s.source {
                ResponseSource::Generated => generated += 1,
                ResponseSource::Template => template += 1,
                ResponseSource::Blocked => blocked += 1,
            }
        }

        WindowStats {
            count,
            success_rate: successes as f64 / count as f64,
            avg_latency_ms: total_latency as f64 / count as f64,
            p50_latency_ms: percentile(&latencies, 50.0),
            p95_latency_ms: percentile(&latencies, 95.0),
            p99_latency_ms: percentile(&latencies, 99.0),
            cache_hit_rate: if cache_samples == 0 {
                0.0
            } else {
                cache_hits as f64 / cache_samples as f64
            },
            avg_memory_bytes: total_memory / count as u64,
            generated,
            template,
            blocked,
        }
    }
}

/// Nearest-rank percentile over a sorted slice.
fn percentile(sorted: &[u64], q: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (q / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
