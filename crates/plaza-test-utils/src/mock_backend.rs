// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock inference backend for deterministic testing.
//!
//! `MockBackend` implements `InferenceBackend` with pre-configured
//! responses, optional artificial latency, scripted failures, and
//! concurrency accounting, enabling fast CI-runnable tests without a
//! real inference server.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use plaza_core::{
    BackendHealth, GenerationOutput, GenerationParams, InferenceBackend, PlazaError,
};
use tokio::sync::Mutex;

/// A mock inference backend with a FIFO response queue.
///
/// When the queue is empty, a default "respuesta simulada" text is
/// returned. Failures can be scripted to exhaust before successes, and
/// every call is counted, including the peak number in flight.
pub struct MockBackend {
    responses: Arc<Mutex<VecDeque<String>>>,
    /// Remaining calls that fail before the queue is consulted.
    failures_remaining: Arc<Mutex<u32>>,
    /// When true, every call fails regardless of the queue.
    always_fail: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            failures_remaining: Arc::new(Mutex::new(0)),
            always_fail: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Pre-load the response queue.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let mock = Self::new();
        {
            let queue = Arc::clone(&mock.responses);
            // Constructor context: no concurrent access yet.
            let mut guard = queue.try_lock().expect("fresh mock is uncontended");
            guard.extend(responses);
        }
        mock
    }

    /// Every call fails with a connection error.
    pub fn always_failing() -> Self {
        Self {
            always_fail: true,
            ..Self::new()
        }
    }

    /// Fail the next `n` calls, then serve the queue.
    pub fn failing_times(self, n: u32) -> Self {
        *self
            .failures_remaining
            .try_lock()
            .expect("fresh mock is uncontended") = n;
        self
    }

    /// Add artificial latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a response to the queue.
    pub async fn push_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// Total generation calls that reached this backend.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Peak number of concurrently in-flight generation calls.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "respuesta simulada".to_string())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks in-flight counts even when the call future is
/// dropped mid-way.
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(in_flight: &Arc<AtomicUsize>, max: &Arc<AtomicUsize>) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<GenerationOutput, PlazaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.always_fail {
            return Err(PlazaError::Connection {
                message: "mock backend scripted failure".to_string(),
                source: None,
            });
        }

        {
            let mut failures = self.failures_remaining.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(PlazaError::Connection {
                    message: "mock backend scripted failure".to_string(),
                    source: None,
                });
            }
        }

        let text = self.next_response().await;
        let token_count = text.split_whitespace().count().max(1) as u32;
        Ok(GenerationOutput {
            text,
            token_count,
            backend_latency_ms: Some(5),
            model: "mock-model".to_string(),
        })
    }

    async fn health_check(&self) -> Result<BackendHealth, PlazaError> {
        if self.always_fail {
            Ok(BackendHealth::Unhealthy("scripted failure".to_string()))
        } else {
            Ok(BackendHealth::Healthy)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams::default()
    }

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let backend = MockBackend::new();
        let out = backend.generate("hola", &params()).await.unwrap();
        assert_eq!(out.text, "respuesta simulada");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn queued_responses_returned_in_order() {
        let backend =
            MockBackend::with_responses(vec!["primera".to_string(), "segunda".to_string()]);
        assert_eq!(
            backend.generate("a", &params()).await.unwrap().text,
            "primera"
        );
        assert_eq!(
            backend.generate("b", &params()).await.unwrap().text,
            "segunda"
        );
        // Queue exhausted: back to the default.
        assert_eq!(
            backend.generate("c", &params()).await.unwrap().text,
            "respuesta simulada"
        );
    }

    #[tokio::test]
    async fn scripted_failures_exhaust_then_succeed() {
        let backend =
            MockBackend::with_responses(vec!["ok".to_string()]).failing_times(2);
        assert!(backend.generate("a", &params()).await.is_err());
        assert!(backend.generate("b", &params()).await.is_err());
        assert_eq!(backend.generate("c", &params()).await.unwrap().text, "ok");
    }

    #[tokio::test]
    async fn always_failing_never_succeeds() {
        let backend = MockBackend::always_failing();
        for _ in 0..5 {
            assert!(backend.generate("x", &params()).await.is_err());
        }
        assert_eq!(backend.calls(), 5);
    }

    #[tokio::test]
    async fn tracks_max_in_flight() {
        let backend =
            Arc::new(MockBackend::new().with_delay(Duration::from_millis(50)));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let b = Arc::clone(&backend);
            handles.push(tokio::spawn(async move {
                let _ = b.generate("x", &params()).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(backend.max_in_flight(), 4);
    }
}
