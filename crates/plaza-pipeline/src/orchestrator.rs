// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request orchestrator.
//!
//! One `Orchestrator` instance serves the whole process. Each request
//! passes through admission control, the inbound safety gate, mode and
//! degraded-health routing, the response cache, and finally bounded
//! generation with retry before falling back to templates. Every request
//! records exactly one performance sample, on every exit path.

use std::sync::Arc;
use std::time::Duration;

use plaza_config::{OperationMode, PipelineConfig, PlazaConfig, validate_config};
use plaza_core::{
    ConversationRequest, ConversationResponse, InferenceBackend, PlazaError, ResponseSource,
    TimingBreakdown, ValidationVerdict,
};
use plaza_fallback::{FallbackGenerator, MessageIntent, classify};
use plaza_inference::{CachedReply, GenerationResult, InferenceClient, cache_key, render_prompt};
use plaza_monitor::{PerformanceMonitor, PerformanceSample, recording};
use plaza_risk::RiskValidator;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Coordinates validation, generation, caching, and fallback for one
/// buyer message at a time per permit.
pub struct Orchestrator {
    config: PipelineConfig,
    client: InferenceClient,
    validator: RiskValidator,
    fallback: FallbackGenerator,
    monitor: Arc<PerformanceMonitor>,
    admission: Arc<Semaphore>,
}

impl Orchestrator {
    /// Build the pipeline from a validated config and a backend adapter.
    ///
    /// Fails on semantic config violations (all of them reported at once)
    /// or on malformed extra risk patterns.
    pub fn new(config: &PlazaConfig, backend: Arc<dyn InferenceBackend>) -> Result<Self, PlazaError> {
        if let Err(errors) = validate_config(config) {
            let joined = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PlazaError::Config(joined));
        }

        let orchestrator = Self {
            config: config.pipeline.clone(),
            client: InferenceClient::new(backend, &config.backend, &config.cache),
            validator: RiskValidator::new(config.risk.clone())?,
            fallback: FallbackGenerator::new(&config.fallback),
            monitor: Arc::new(PerformanceMonitor::new(config.monitor.clone())),
            admission: Arc::new(Semaphore::new(config.pipeline.max_concurrent_requests)),
        };
        info!(
            mode = ?orchestrator.config.mode,
            max_concurrent = orchestrator.config.max_concurrent_requests,
            model = orchestrator.client.model(),
            "pipeline ready"
        );
        Ok(orchestrator)
    }

    /// Handle a request, failing fast with [`PlazaError::Overloaded`] when
    /// every admission permit is taken.
    pub async fn generate(
        &self,
        request: ConversationRequest,
    ) -> Result<ConversationResponse, PlazaError> {
        let permit = match Arc::clone(&self.admission).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    max_concurrent = self.config.max_concurrent_requests,
                    "admission rejected: pipeline saturated"
                );
                return Err(PlazaError::Overloaded(format!(
                    "all {} admission permits in use",
                    self.config.max_concurrent_requests
                )));
            }
        };
        Ok(self.run(request, permit).await)
    }

    /// Handle a request, waiting up to `deadline` for an admission permit
    /// instead of failing fast. Deadline expiry downgrades to a template
    /// reply rather than an error.
    pub async fn generate_with_deadline(
        &self,
        request: ConversationRequest,
        deadline: Duration,
    ) -> Result<ConversationResponse, PlazaError> {
        let started = Instant::now();
        let acquired =
            tokio::time::timeout(deadline, Arc::clone(&self.admission).acquire_owned()).await;
        let permit = match acquired {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                return Err(PlazaError::Internal(
                    "admission semaphore closed".to_string(),
                ));
            }
            Err(_) => {
                warn!(deadline = ?deadline, "admission deadline expired; serving fallback");
                return Ok(self.admission_expired(&request, started));
            }
        };
        Ok(self.run(request, permit).await)
    }

    /// Fallback for a request whose deadline expired waiting for a
    /// permit. Needs no permit of its own: the inbound gate and templates
    /// never touch the backend.
    fn admission_expired(
        &self,
        request: &ConversationRequest,
        started: Instant,
    ) -> ConversationResponse {
        let inbound = self
            .validator
            .validate(&request.message, request.buyer_profile.as_ref());
        let validation_ms = inbound.validation_time_ms;
        if !inbound.is_safe {
            return self.finish_blocked(request, inbound, started, validation_ms);
        }
        self.finish_template(request, started, validation_ms, false, false, None)
    }

    /// The performance monitor, for snapshots and alert registration.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// The inference client, for cache maintenance and health probes.
    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    /// The full pipeline for one admitted request. Infallible: every
    /// failure downgrades to a template reply. The permit is released
    /// when this future completes or is dropped.
    async fn run(
        &self,
        request: ConversationRequest,
        _permit: OwnedSemaphorePermit,
    ) -> ConversationResponse {
        let started = Instant::now();

        // Inbound gate, unconditional: validation_required only governs
        // the outbound pass.
        let inbound = self
            .validator
            .validate(&request.message, request.buyer_profile.as_ref());
        let mut validation_ms = inbound.validation_time_ms;
        recording::record_validation_latency(inbound.validation_time_ms as f64 / 1000.0);

        if !inbound.is_safe {
            warn!(
                risk = inbound.risk_score,
                violations = inbound.critical_violations.len(),
                "inbound message blocked"
            );
            return self.finish_blocked(&request, inbound, started, validation_ms);
        }

        let health = self.monitor.health_score();
        let degraded = health < self.config.degraded_health_floor;
        let template_routed = match self.config.mode {
            OperationMode::TemplateOnly => true,
            OperationMode::Hybrid => classify(&request.message) == MessageIntent::Greeting,
            OperationMode::GenerationFirst => false,
        };
        if degraded {
            warn!(
                health,
                floor = self.config.degraded_health_floor,
                "degraded health: routing to template"
            );
        }
        if template_routed || degraded {
            return self.finish_template(&request, started, validation_ms, true, degraded, None);
        }

        let key = cache_key(&request);
        if let Some(cached) = self.client.cache().get(&key) {
            recording::record_cache_lookup(true);
            debug!(key = %key, "cache hit");
            return self.finish_cached(&request, cached, started, validation_ms);
        }
        recording::record_cache_lookup(false);

        let prompt = render_prompt(&request);
        let budget = Duration::from_millis(self.config.request_budget_ms);
        let Some(result) = self
            .try_generate(&prompt, request.max_retries, started, budget)
            .await
        else {
            return self.finish_template(
                &request,
                started,
                validation_ms,
                false,
                false,
                Some(false),
            );
        };
        recording::record_generation_latency(result.latency_ms as f64 / 1000.0);

        let verdict = if request.validation_required {
            let v = self.validator.validate(&result.text, None);
            validation_ms += v.validation_time_ms;
            recording::record_validation_latency(v.validation_time_ms as f64 / 1000.0);
            v
        } else {
            ValidationVerdict::safe()
        };

        if !verdict.is_safe {
            warn!(
                risk = verdict.risk_score,
                "generated text failed outbound validation; discarded"
            );
            return self.finish_template(&request, started, validation_ms, true, false, Some(false));
        }

        // Only text the validator actually scored may enter the shared
        // cache; a skipped outbound pass means no admission.
        if request.validation_required && verdict.risk_score < self.validator.flag_threshold() {
            self.client.cache().insert(
                key,
                CachedReply {
                    text: result.text.clone(),
                    confidence: result.confidence,
                    risk_score: verdict.risk_score,
                    token_count: result.token_count,
                    model: result.model.clone(),
                    verdict: verdict.clone(),
                },
            );
        }

        self.finish_generated(&request, result, verdict, started, validation_ms)
    }

    /// Generation with exponential backoff, bounded by the request budget.
    ///
    /// An open circuit aborts retrying immediately: the backoff would only
    /// hit the same open breaker again.
    async fn try_generate(
        &self,
        prompt: &str,
        max_retries: u32,
        started: Instant,
        budget: Duration,
    ) -> Option<GenerationResult> {
        let mut attempt: u32 = 0;
        loop {
            if started.elapsed() >= budget {
                warn!(budget_ms = budget.as_millis() as u64, "request budget exhausted");
                return None;
            }

            match self.client.generate(prompt).await {
                Ok(result) => return Some(result),
                Err(PlazaError::CircuitOpen { retry_after }) => {
                    warn!(retry_after = ?retry_after, "circuit open: skipping retries");
                    return None;
                }
                Err(e) if e.is_recoverable() && attempt < max_retries => {
                    let backoff = Duration::from_millis(
                        self.config
                            .retry_backoff_ms
                            .saturating_mul(2u64.saturating_pow(attempt)),
                    );
                    recording::record_retry();
                    warn!(attempt, error = %e, backoff_ms = backoff.as_millis() as u64,
                        "generation attempt failed; backing off");
                    if started.elapsed() + backoff >= budget {
                        return None;
                    }
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "generation failed");
                    return None;
                }
            }
        }
    }

    fn finish_blocked(
        &self,
        request: &ConversationRequest,
        inbound: ValidationVerdict,
        started: Instant,
        validation_ms: u64,
    ) -> ConversationResponse {
        let reply = self.fallback.safety_response(request.personality);
        let mut response =
            ConversationResponse::new(reply.text, ResponseSource::Blocked, request.personality);
        response.confidence = reply.confidence;
        response.risk_score = inbound.risk_score;
        response.verdict = inbound;
        response.timing = self.timing(started, 0, validation_ms);
        self.annotate(&mut response);
        recording::record_blocked();
        self.record(&response, true, None);
        response
    }

    fn finish_template(
        &self,
        request: &ConversationRequest,
        started: Instant,
        mut validation_ms: u64,
        success: bool,
        degraded: bool,
        cache_hit: Option<bool>,
    ) -> ConversationResponse {
        let reply = self.fallback.respond(request);
        // The response risk score always reflects the text actually
        // returned, so templates are validated too.
        let verdict = self.validator.validate(&reply.text, None);
        validation_ms += verdict.validation_time_ms;

        let mut response =
            ConversationResponse::new(reply.text, ResponseSource::Template, request.personality);
        response.confidence = reply.confidence;
        response.risk_score = verdict.risk_score;
        response.verdict = verdict;
        response.timing = self.timing(started, 0, validation_ms);
        if degraded {
            response.metadata.insert("degraded".into(), "true".into());
        }
        self.annotate(&mut response);
        self.record(&response, success, cache_hit);
        response
    }

    fn finish_cached(
        &self,
        request: &ConversationRequest,
        cached: CachedReply,
        started: Instant,
        validation_ms: u64,
    ) -> ConversationResponse {
        let mut response =
            ConversationResponse::new(cached.text, ResponseSource::Generated, request.personality);
        response.confidence = cached.confidence;
        response.risk_score = cached.risk_score;
        response.verdict = cached.verdict;
        response.model = cached.model;
        response.token_count = cached.token_count;
        response.timing = self.timing(started, 0, validation_ms);
        response.metadata.insert("cache".into(), "hit".into());
        self.annotate(&mut response);
        self.record(&response, true, Some(true));
        response
    }

    fn finish_generated(
        &self,
        request: &ConversationRequest,
        result: GenerationResult,
        verdict: ValidationVerdict,
        started: Instant,
        validation_ms: u64,
    ) -> ConversationResponse {
        let mut response =
            ConversationResponse::new(result.text, ResponseSource::Generated, request.personality);
        response.confidence = result.confidence;
        response.risk_score = verdict.risk_score;
        response.verdict = verdict;
        response.model = result.model;
        response.token_count = result.token_count;
        response.timing = self.timing(started, result.latency_ms, validation_ms);
        response.metadata.insert("cache".into(), "miss".into());
        self.annotate(&mut response);
        self.record(&response, true, Some(false));
        response
    }

    fn timing(&self, started: Instant, generation_ms: u64, validation_ms: u64) -> TimingBreakdown {
        TimingBreakdown {
            generation_ms,
            validation_ms,
            total_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn annotate(&self, response: &mut ConversationResponse) {
        if self.config.debug_metadata {
            response
                .metadata
                .insert("mode".into(), format!("{:?}", self.config.mode));
            response
                .metadata
                .insert("health".into(), format!("{:.1}", self.monitor.health_score()));
        }
    }

    /// The single per-request sample and request counters.
    fn record(&self, response: &ConversationResponse, success: bool, cache_hit: Option<bool>) {
        recording::record_request(&response.source.to_string());
        recording::set_pool_available(self.client.pool().available() as f64);

        let mut sample =
            PerformanceSample::new(response.timing.total_ms, success, response.source);
        if let Some(hit) = cache_hit {
            sample = sample.with_cache_hit(hit);
        }
        self.monitor.record(sample);
    }
}
