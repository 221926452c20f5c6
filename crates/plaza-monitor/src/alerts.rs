// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert rules evaluated after every recorded sample.
//!
//! Rules compare a window aggregate against a threshold and invoke a
//! registered callback when crossed, with a per-rule cooldown so a
//! sustained breach fires once per cooldown period rather than once per
//! request.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::window::WindowStats;

/// Which aggregate a rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertMetric {
    SuccessRate,
    P95LatencyMs,
    CacheHitRate,
    HealthScore,
    MemoryBytes,
}

impl fmt::Display for AlertMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertMetric::SuccessRate => "success_rate",
            AlertMetric::P95LatencyMs => "p95_latency_ms",
            AlertMetric::CacheHitRate => "cache_hit_rate",
            AlertMetric::HealthScore => "health_score",
            AlertMetric::MemoryBytes => "memory_bytes",
        };
        f.write_str(s)
    }
}

/// Whether the rule fires when the value drops below or rises above the
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDirection {
    Below,
    Above,
}

pub type AlertCallback = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// A named alert rule with a firing cooldown.
pub struct AlertRule {
    pub name: String,
    pub metric: AlertMetric,
    pub direction: AlertDirection,
    pub threshold: f64,
    pub cooldown: Duration,
    callback: AlertCallback,
    last_fired: Option<Instant>,
}

impl AlertRule {
    pub fn new(
        name: impl Into<String>,
        metric: AlertMetric,
        direction: AlertDirection,
        threshold: f64,
        cooldown: Duration,
        callback: AlertCallback,
    ) -> Self {
        Self {
            name: name.into(),
            metric,
            direction,
            threshold,
            cooldown,
            callback,
            last_fired: None,
        }
    }

    fn breached(&self, value: f64) -> bool {
        match self.direction {
            AlertDirection::Below => value < self.threshold,
            AlertDirection::Above => value > self.threshold,
        }
    }

    fn in_cooldown(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(at) => now.duration_since(at) < self.cooldown,
            None => false,
        }
    }
}

/// The registered rules, evaluated together on each append.
#[derive(Default)]
pub struct AlertRegistry {
    rules: Vec<AlertRule>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: AlertRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against the current aggregates; fire callbacks
    /// for breached rules that are out of cooldown.
    pub fn evaluate(&mut self, stats: &WindowStats, health: f64) {
        let now = Instant::now();
        for rule in &mut self.rules {
            let value = match rule.metric {
                AlertMetric::SuccessRate => stats.success_rate,
                AlertMetric::P95LatencyMs => stats.p95_latency_ms as f64,
                AlertMetric::CacheHitRate => stats.cache_hit_rate,
                AlertMetric::HealthScore => health,
                AlertMetric::MemoryBytes => stats.avg_memory_bytes as f64,
            };

            if rule.breached(value) && !rule.in_cooldown(now) {
                rule.last_fired = Some(now);
                warn!(
                    rule = %rule.name,
                    metric = %rule.metric,
                    value,
                    threshold = rule.threshold,
                    "alert rule fired"
                );
                (rule.callback)(&rule.name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_callback() -> (AlertCallback, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);
        let cb: AlertCallback = Arc::new(move |_name, _value| {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        (cb, fired)
    }

    fn degraded_stats() -> WindowStats {
        WindowStats {
            count: 10,
            success_rate: 0.5,
            p95_latency_ms: 12_000,
            ..WindowStats::default()
        }
    }

    #[tokio::test]
    async fn rule_fires_when_breached() {
        let (cb, fired) = counting_callback();
        let mut registry = AlertRegistry::new();
        registry.register(AlertRule::new(
            "low_success",
            AlertMetric::SuccessRate,
            AlertDirection::Below,
            0.9,
            Duration::from_secs(60),
            cb,
        ));

        registry.evaluate(&degraded_stats(), 80.0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn healthy_values_do_not_fire() {
        let (cb, fired) = counting_callback();
        let mut registry = AlertRegistry::new();
        registry.register(AlertRule::new(
            "low_health",
            AlertMetric::HealthScore,
            AlertDirection::Below,
            40.0,
            Duration::from_secs(60),
            cb,
        ));

        registry.evaluate(&degraded_stats(), 90.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_suppresses_repeat_firings() {
        let (cb, fired) = counting_callback();
        let mut registry = AlertRegistry::new();
        registry.register(AlertRule::new(
            "slow_p95",
            AlertMetric::P95LatencyMs,
            AlertDirection::Above,
            5_000.0,
            Duration::from_secs(60),
            cb,
        ));

        registry.evaluate(&degraded_stats(), 80.0);
        registry.evaluate(&degraded_stats(), 80.0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        registry.evaluate(&degraded_stats(), 80.0);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
