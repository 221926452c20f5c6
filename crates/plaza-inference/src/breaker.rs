// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Circuit breaker for the inference backend.
//!
//! After `failure_threshold` consecutive failures the circuit opens and
//! calls fail immediately with [`PlazaError::CircuitOpen`] for a cooldown
//! period. One trial call is then allowed (half-open); success closes the
//! circuit, failure reopens it with a doubled cooldown up to a cap.

use std::time::Duration;

use parking_lot::Mutex;
use plaza_config::BreakerConfig;
use plaza_core::PlazaError;
use tokio::time::Instant;
use tracing::{info, warn};

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls fail fast until the cooldown elapses.
    Open,
    /// One trial call is in flight.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    cooldown: Duration,
}

/// Shared circuit breaker; owned by the inference client.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    base_cooldown: Duration,
    cooldown_cap: Duration,
}

impl CircuitBreaker {
    pub fn new(config: &BreakerConfig) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                cooldown: Duration::from_secs(config.cooldown_secs),
            }),
            failure_threshold: config.failure_threshold,
            base_cooldown: Duration::from_secs(config.cooldown_secs),
            cooldown_cap: Duration::from_secs(config.cooldown_cap_secs),
        }
    }

    /// Gate a call. `Ok(())` admits it; an open circuit rejects it with
    /// the remaining cooldown. The first call after the cooldown elapses
    /// becomes the half-open trial; further calls are rejected until the
    /// trial resolves.
    pub fn check(&self) -> Result<(), PlazaError> {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Err(PlazaError::CircuitOpen {
                retry_after: inner.cooldown,
            }),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= inner.cooldown {
                    info!("cooldown elapsed, admitting half-open trial call");
                    inner.state = CircuitState::HalfOpen;
                    Ok(())
                } else {
                    Err(PlazaError::CircuitOpen {
                        retry_after: inner.cooldown - elapsed,
                    })
                }
            }
        }
    }

    /// Record a successful backend call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(state = %inner.state, "circuit closed after successful call");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.cooldown = self.base_cooldown;
    }

    /// Record a failed backend call (errors, timeouts, and cancellations
    /// of in-flight calls all count).
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                // Failed trial: reopen with doubled cooldown.
                inner.cooldown = (inner.cooldown * 2).min(self.cooldown_cap);
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                warn!(cooldown = ?inner.cooldown, "half-open trial failed, circuit reopened");
            }
            _ => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold
                    && inner.state == CircuitState::Closed
                {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    warn!(
                        failures = inner.consecutive_failures,
                        cooldown = ?inner.cooldown,
                        "failure threshold reached, circuit opened"
                    );
                }
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(&BreakerConfig {
            failure_threshold: 3,
            cooldown_secs: 30,
            cooldown_cap_secs: 240,
        })
    }

    #[tokio::test]
    async fn starts_closed_and_admits() {
        let b = breaker();
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.check().is_ok());
    }

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(matches!(
            b.check().unwrap_err(),
            PlazaError::CircuitOpen { .. }
        ));
    }

    #[tokio::test]
    async fn success_resets_the_failure_count() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        b.record_success();
        b.record_failure();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_trial_after_cooldown() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        assert_eq!(b.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.check().is_ok(), "first call after cooldown is the trial");
        assert_eq!(b.state(), CircuitState::HalfOpen);

        // A second caller is rejected while the trial is in flight.
        assert!(b.check().is_err());

        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.check().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trial_doubles_cooldown_up_to_cap() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }

        // First trial fails: cooldown 30 -> 60.
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.check().is_ok());
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.check().is_err(), "doubled cooldown not yet elapsed");
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(b.check().is_ok());

        // Keep failing trials; cooldown caps at 240.
        b.record_failure(); // 120
        tokio::time::advance(Duration::from_secs(121)).await;
        assert!(b.check().is_ok());
        b.record_failure(); // 240
        tokio::time::advance(Duration::from_secs(241)).await;
        assert!(b.check().is_ok());
        b.record_failure(); // capped at 240
        tokio::time::advance(Duration::from_secs(241)).await;
        assert!(b.check().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn success_restores_base_cooldown() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.check().is_ok());
        b.record_failure(); // cooldown now 60

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(b.check().is_ok());
        b.record_success();

        // Re-open and verify the base cooldown applies again.
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(b.check().is_ok(), "base cooldown should be restored");
    }

    #[test]
    fn state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::Open.to_string(), "open");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
    }
}
