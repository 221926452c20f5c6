// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapter for an Ollama-compatible local inference server.
//!
//! Implements [`InferenceBackend`] over the `/api/generate` endpoint.
//! Per-attempt timeouts, pooling, caching, and circuit breaking live in
//! [`crate::client::InferenceClient`]; this adapter only speaks the wire
//! protocol.

use std::time::Duration;

use async_trait::async_trait;
use plaza_core::{
    BackendHealth, GenerationOutput, GenerationParams, InferenceBackend, PlazaError,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on any single HTTP exchange. The effective per-attempt
/// timeout is enforced by the client wrapper and is always shorter.
const HTTP_HARD_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP backend for a local Ollama-style inference server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: u32,
    /// Backend-reported generation time in nanoseconds.
    #[serde(default)]
    eval_duration: u64,
    #[serde(default)]
    model: String,
}

impl HttpBackend {
    /// Creates a backend adapter for `base_url` generating with `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, PlazaError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_HARD_TIMEOUT)
            .build()
            .map_err(|e| PlazaError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl InferenceBackend for HttpBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<GenerationOutput, PlazaError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    PlazaError::Connection {
                        message: format!("backend unreachable at {url}: {e}"),
                        source: Some(Box::new(e)),
                    }
                } else {
                    PlazaError::Backend {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    }
                }
            })?;

        let status = response.status();
        debug!(status = %status, "generation response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlazaError::Backend {
                message: format!("backend returned {status}: {body}"),
                source: None,
            });
        }

        let body = response.text().await.map_err(|e| PlazaError::Backend {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| PlazaError::Backend {
                message: format!("failed to parse backend response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let model = if parsed.model.is_empty() {
            self.model.clone()
        } else {
            parsed.model
        };

        Ok(GenerationOutput {
            text: parsed.response,
            token_count: parsed.eval_count,
            backend_latency_ms: (parsed.eval_duration > 0)
                .then(|| parsed.eval_duration / 1_000_000),
            model,
        })
    }

    async fn health_check(&self) -> Result<BackendHealth, PlazaError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(BackendHealth::Healthy),
            Ok(resp) => Ok(BackendHealth::Degraded(format!(
                "backend returned {}",
                resp.status()
            ))),
            Err(e) => Ok(BackendHealth::Unhealthy(format!("unreachable: {e}"))),
        }
    }
}
