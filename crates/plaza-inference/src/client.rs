// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inference client: pooled, cached, circuit-broken access to the
//! backend.
//!
//! The client owns the only state shared across concurrent requests --
//! the connection pool, the response cache, and the breaker -- as fields
//! of a single instance constructed at process start, never as globals.

use std::sync::Arc;
use std::time::Duration;

use plaza_config::{BackendConfig, CacheConfig};
use plaza_core::{BackendHealth, GenerationParams, InferenceBackend, PlazaError};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::breaker::CircuitBreaker;
use crate::cache::ResponseCache;
use crate::pool::BackendPool;

/// Latency-per-token at or below which confidence saturates at 1.0.
const CONFIDENCE_FLOOR_MS_PER_TOKEN: f64 = 50.0;
/// Latency-per-token at which confidence reaches 0.
const CONFIDENCE_CEIL_MS_PER_TOKEN: f64 = 500.0;

/// Output of one successful client generation.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub token_count: u32,
    pub latency_ms: u64,
    /// Derived from latency-per-token; a proxy, not a model probability.
    pub confidence: f32,
    pub model: String,
}

/// Pooled and cached client to the inference backend.
pub struct InferenceClient {
    backend: Arc<dyn InferenceBackend>,
    params: GenerationParams,
    attempt_timeout: Duration,
    pool: BackendPool,
    cache: ResponseCache,
    breaker: CircuitBreaker,
}

impl InferenceClient {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        backend_config: &BackendConfig,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            backend,
            params: GenerationParams {
                temperature: backend_config.temperature,
                max_tokens: backend_config.max_tokens,
                top_p: backend_config.top_p,
                top_k: backend_config.top_k,
            },
            attempt_timeout: Duration::from_secs(backend_config.timeout_secs),
            pool: BackendPool::new(backend_config.pool_size),
            cache: ResponseCache::new(
                cache_config.max_entries,
                Duration::from_secs(cache_config.ttl_secs),
            ),
            breaker: CircuitBreaker::new(&backend_config.breaker),
        }
    }

    /// The response cache; the orchestrator reads and writes it directly
    /// because cacheability depends on post-generation validation.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn pool(&self) -> &BackendPool {
        &self.pool
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// One generation attempt: breaker gate, pool permit, bounded call.
    ///
    /// Timeouts, backend errors, and cancellation of this future while the
    /// backend call is in flight are all recorded as breaker failures. The
    /// permit is released on every exit path.
    pub async fn generate(&self, prompt: &str) -> Result<GenerationResult, PlazaError> {
        self.breaker.check()?;

        let _permit = self.pool.acquire(self.attempt_timeout).await?;
        let started = Instant::now();
        let cancel_guard = CancellationGuard::new(&self.breaker);

        let outcome =
            tokio::time::timeout(self.attempt_timeout, self.backend.generate(prompt, &self.params))
                .await;
        cancel_guard.disarm();

        match outcome {
            Err(_) => {
                self.breaker.record_failure();
                warn!(timeout = ?self.attempt_timeout, "generation attempt timed out");
                Err(PlazaError::GenerationTimeout {
                    duration: self.attempt_timeout,
                })
            }
            Ok(Err(e)) => {
                self.breaker.record_failure();
                Err(e)
            }
            Ok(Ok(output)) => {
                self.breaker.record_success();
                let latency_ms = started.elapsed().as_millis() as u64;
                let confidence = confidence_score(latency_ms, output.token_count);
                debug!(
                    latency_ms,
                    tokens = output.token_count,
                    confidence,
                    "generation attempt succeeded"
                );
                Ok(GenerationResult {
                    text: output.text,
                    token_count: output.token_count,
                    latency_ms,
                    confidence,
                    model: output.model,
                })
            }
        }
    }

    /// Probe backend health; failures map to `Unhealthy` rather than
    /// erroring, so the monitor can always read a state.
    pub async fn health(&self) -> BackendHealth {
        match self.backend.health_check().await {
            Ok(health) => health,
            Err(e) => BackendHealth::Unhealthy(e.to_string()),
        }
    }
}

/// Counts a dropped in-flight backend call as a breaker failure.
///
/// Armed while the backend call is pending; disarmed once the call
/// resolves, at which point the outcome itself drives the breaker.
struct CancellationGuard<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl<'a> CancellationGuard<'a> {
    fn new(breaker: &'a CircuitBreaker) -> Self {
        Self { breaker, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancellationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("in-flight generation cancelled; recorded as breaker failure");
            self.breaker.record_failure();
        }
    }
}

/// Map latency-per-token to a confidence in [0, 1].
///
/// Lower latency per token correlates with higher confidence. This is a
/// proxy inherited from the original heuristic, not a statement about
/// response quality.
pub fn confidence_score(latency_ms: u64, token_count: u32) -> f32 {
    let ms_per_token = latency_ms as f64 / f64::from(token_count.max(1));
    let range = CONFIDENCE_CEIL_MS_PER_TOKEN - CONFIDENCE_FLOOR_MS_PER_TOKEN;
    let score = 1.0 - (ms_per_token - CONFIDENCE_FLOOR_MS_PER_TOKEN) / range;
    score.clamp(0.0, 1.0) as f32
}
