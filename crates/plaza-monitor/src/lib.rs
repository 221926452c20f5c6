// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Performance monitoring for the Plaza pipeline.
//!
//! The orchestrator records one [`PerformanceSample`] per request; the
//! monitor retains them in a ring buffer, keeps rolling short/long window
//! aggregates, blends a composite health score, and evaluates alert rules
//! on every append. The health score is stored in an atomic so the hot
//! path reads it without taking a lock.

pub mod alerts;
pub mod health;
pub mod recording;
pub mod window;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use plaza_config::MonitorConfig;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::time::Instant;
use tracing::debug;

pub use alerts::{AlertCallback, AlertDirection, AlertMetric, AlertRegistry, AlertRule};
pub use health::health_score;
pub use window::{PerformanceSample, SampleWindow, WindowStats};

/// Minimum interval between process-memory refreshes.
const MEMORY_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Point-in-time view of the monitor's aggregates.
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub short_window: WindowStats,
    pub long_window: WindowStats,
    pub health_score: f64,
    pub retained_samples: usize,
}

struct MemoryProbe {
    system: System,
    pid: Option<Pid>,
    cached_bytes: u64,
    refreshed_at: Option<Instant>,
}

impl MemoryProbe {
    fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
            cached_bytes: 0,
            refreshed_at: None,
        }
    }

    /// Resident memory of this process, refreshed at most every
    /// [`MEMORY_PROBE_INTERVAL`].
    fn current_bytes(&mut self) -> u64 {
        let now = Instant::now();
        let stale = match self.refreshed_at {
            Some(at) => now.duration_since(at) >= MEMORY_PROBE_INTERVAL,
            None => true,
        };
        if stale {
            if let Some(pid) = self.pid {
                self.system
                    .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                if let Some(process) = self.system.process(pid) {
                    self.cached_bytes = process.memory();
                }
            }
            self.refreshed_at = Some(now);
        }
        self.cached_bytes
    }
}

/// Records samples, maintains rolling aggregates, and scores health.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    window: Mutex<SampleWindow>,
    alerts: Mutex<AlertRegistry>,
    memory: Mutex<MemoryProbe>,
    /// f64 bit pattern of the latest health score.
    health_bits: AtomicU64,
}

impl PerformanceMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let window = SampleWindow::new(config.sample_capacity);
        Self {
            config,
            window: Mutex::new(window),
            alerts: Mutex::new(AlertRegistry::new()),
            memory: Mutex::new(MemoryProbe::new()),
            health_bits: AtomicU64::new(100.0f64.to_bits()),
        }
    }

    pub fn register_alert(&self, rule: AlertRule) {
        self.alerts.lock().register(rule);
    }

    /// Record one completed request.
    ///
    /// Stamps the sample with current process memory, recomputes the
    /// short-window health score, and evaluates alert rules.
    pub fn record(&self, sample: PerformanceSample) {
        let memory_bytes = self.memory.lock().current_bytes();
        let sample = sample.with_memory_bytes(memory_bytes);

        let short = {
            let mut window = self.window.lock();
            window.push(sample);
            window.stats(Duration::from_secs(self.config.short_window_secs))
        };

        let threshold_bytes = self.config.memory_threshold_mb * 1024 * 1024;
        let score = health_score(&short, threshold_bytes);
        self.health_bits.store(score.to_bits(), Ordering::Relaxed);
        recording::set_health_score(score);
        debug!(
            health = score,
            samples = short.count,
            success_rate = short.success_rate,
            "sample recorded"
        );

        self.alerts.lock().evaluate(&short, score);
    }

    /// Latest health score; lock-free, safe to call on the hot path.
    pub fn health_score(&self) -> f64 {
        f64::from_bits(self.health_bits.load(Ordering::Relaxed))
    }

    /// Aggregate view over both configured windows.
    pub fn snapshot(&self) -> MonitorSnapshot {
        let window = self.window.lock();
        MonitorSnapshot {
            short_window: window.stats(Duration::from_secs(self.config.short_window_secs)),
            long_window: window.stats(Duration::from_secs(self.config.long_window_secs)),
            health_score: self.health_score(),
            retained_samples: window.len(),
        }
    }
}
