// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as threshold ordering and positive sizes. Collects
//! all violations instead of failing fast so operators can fix a config
//! file in one pass.

use plaza_core::PlazaError;

use crate::model::PlazaConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<PlazaError>)`
/// with all collected validation errors.
pub fn validate_config(config: &PlazaConfig) -> Result<(), Vec<PlazaError>> {
    let mut errors = Vec::new();

    if config.pipeline.max_concurrent_requests == 0 {
        errors.push(PlazaError::Config(
            "pipeline.max_concurrent_requests must be at least 1".to_string(),
        ));
    }

    if config.pipeline.request_budget_ms == 0 {
        errors.push(PlazaError::Config(
            "pipeline.request_budget_ms must be positive".to_string(),
        ));
    }

    if !(0.0..=100.0).contains(&config.pipeline.degraded_health_floor) {
        errors.push(PlazaError::Config(format!(
            "pipeline.degraded_health_floor must be in [0, 100], got {}",
            config.pipeline.degraded_health_floor
        )));
    }

    if config.backend.base_url.trim().is_empty() {
        errors.push(PlazaError::Config(
            "backend.base_url must not be empty".to_string(),
        ));
    }

    if config.backend.model.trim().is_empty() {
        errors.push(PlazaError::Config(
            "backend.model must not be empty".to_string(),
        ));
    }

    if !(config.backend.temperature > 0.0 && config.backend.temperature <= 2.0) {
        errors.push(PlazaError::Config(format!(
            "backend.temperature must be in (0, 2], got {}",
            config.backend.temperature
        )));
    }

    if config.backend.max_tokens == 0 {
        errors.push(PlazaError::Config(
            "backend.max_tokens must be positive".to_string(),
        ));
    }

    if config.backend.timeout_secs == 0 {
        errors.push(PlazaError::Config(
            "backend.timeout_secs must be positive".to_string(),
        ));
    }

    if config.backend.pool_size == 0 {
        errors.push(PlazaError::Config(
            "backend.pool_size must be at least 1".to_string(),
        ));
    }

    if config.backend.breaker.failure_threshold == 0 {
        errors.push(PlazaError::Config(
            "backend.breaker.failure_threshold must be at least 1".to_string(),
        ));
    }

    if config.backend.breaker.cooldown_cap_secs < config.backend.breaker.cooldown_secs {
        errors.push(PlazaError::Config(format!(
            "backend.breaker.cooldown_cap_secs ({}) must not be below cooldown_secs ({})",
            config.backend.breaker.cooldown_cap_secs, config.backend.breaker.cooldown_secs
        )));
    }

    if config.cache.max_entries == 0 {
        errors.push(PlazaError::Config(
            "cache.max_entries must be at least 1".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(PlazaError::Config(
            "cache.ttl_secs must be positive".to_string(),
        ));
    }

    if config.risk.blocking_threshold > 100 {
        errors.push(PlazaError::Config(format!(
            "risk.blocking_threshold must be at most 100, got {}",
            config.risk.blocking_threshold
        )));
    }

    if config.risk.flag_threshold >= config.risk.blocking_threshold {
        errors.push(PlazaError::Config(format!(
            "risk.flag_threshold ({}) must be below blocking_threshold ({})",
            config.risk.flag_threshold, config.risk.blocking_threshold
        )));
    }

    // A single critical match must cross the blocking threshold on its own.
    if config.risk.critical_weight < config.risk.blocking_threshold {
        errors.push(PlazaError::Config(format!(
            "risk.critical_weight ({}) must be at least blocking_threshold ({})",
            config.risk.critical_weight, config.risk.blocking_threshold
        )));
    }

    if !(0.0..=1.0).contains(&config.fallback.template_confidence) {
        errors.push(PlazaError::Config(format!(
            "fallback.template_confidence must be in [0, 1], got {}",
            config.fallback.template_confidence
        )));
    }

    if config.monitor.sample_capacity == 0 {
        errors.push(PlazaError::Config(
            "monitor.sample_capacity must be at least 1".to_string(),
        ));
    }

    if config.monitor.short_window_secs == 0
        || config.monitor.long_window_secs < config.monitor.short_window_secs
    {
        errors.push(PlazaError::Config(format!(
            "monitor windows must satisfy 0 < short_window_secs ({}) <= long_window_secs ({})",
            config.monitor.short_window_secs, config.monitor.long_window_secs
        )));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
