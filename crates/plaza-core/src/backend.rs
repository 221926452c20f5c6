// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait for the inference backend.
//!
//! The backend is treated as an unreliable network dependency: it may be
//! slow, down, or return partial data. Resilience (pooling, caching,
//! circuit breaking, timeouts) lives in `plaza-inference`, not here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlazaError;

/// Sampling parameters forwarded to the backend with each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 256,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

/// Raw output of one backend generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub text: String,
    /// Backend-reported token count for the generated text.
    pub token_count: u32,
    /// Backend-reported generation time, when available.
    pub backend_latency_ms: Option<u64>,
    pub model: String,
}

/// Health reported by a backend health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Adapter for the language-model inference service.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// The model identifier this backend generates with.
    fn model(&self) -> &str;

    /// Generates text for a fully rendered prompt.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GenerationOutput, PlazaError>;

    /// Probes the backend without generating.
    async fn health_check(&self) -> Result<BackendHealth, PlazaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_are_in_range() {
        let p = GenerationParams::default();
        assert!(p.temperature > 0.0 && p.temperature <= 2.0);
        assert!(p.top_p > 0.0 && p.top_p <= 1.0);
        assert!(p.max_tokens > 0);
    }

    #[test]
    fn health_variants_compare() {
        assert_eq!(BackendHealth::Healthy, BackendHealth::Healthy);
        assert_ne!(
            BackendHealth::Healthy,
            BackendHealth::Degraded("slow".into())
        );
    }
}
