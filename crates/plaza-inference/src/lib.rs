// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference client for the Plaza reply pipeline.
//!
//! Wraps any [`plaza_core::InferenceBackend`] with the resilience layers
//! the orchestrator relies on: a bounded connection-permit pool, a
//! TTL+LRU response cache, a circuit breaker, and per-attempt timeouts.

pub mod breaker;
pub mod cache;
pub mod client;
pub mod http;
pub mod pool;
pub mod prompt;

pub use breaker::{CircuitBreaker, CircuitState};
pub use cache::{CacheStats, CachedReply, ResponseCache};
pub use client::{GenerationResult, InferenceClient, confidence_score};
pub use http::HttpBackend;
pub use pool::BackendPool;
pub use prompt::{cache_key, render_prompt};
