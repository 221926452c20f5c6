// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Plaza reply pipeline.
//!
//! Note that a blocked reply is *not* an error: blocking is a successful
//! outcome surfaced as a normal [`crate::types::ConversationResponse`]
//! with source `blocked`. Only startup misconfiguration and saturation
//! without a deadline ever reach the caller as `Err`.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across the Plaza pipeline crates.
#[derive(Debug, Error)]
pub enum PlazaError {
    /// Configuration errors (invalid TOML, out-of-range thresholds, missing fields).
    /// Surfaced at startup, never per-request.
    #[error("configuration error: {0}")]
    Config(String),

    /// Inference backend unreachable (connection refused, DNS failure, reset).
    #[error("connection error: {message}")]
    Connection {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Circuit breaker is open; the backend is not being called.
    #[error("circuit open, retry after {retry_after:?}")]
    CircuitOpen { retry_after: Duration },

    /// A generation attempt or the overall request budget timed out.
    #[error("generation timed out after {duration:?}")]
    GenerationTimeout { duration: Duration },

    /// Risk validator misconfiguration (malformed pattern, bad weights).
    /// Fatal at startup, never per-request.
    #[error("validator error: {0}")]
    Validation(String),

    /// Backend returned an error response or unparseable payload.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Concurrency limiter saturated and the caller supplied no deadline.
    /// Surfaced so the caller can apply backpressure.
    #[error("pipeline overloaded: {0}")]
    Overloaded(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlazaError {
    /// True for failures that the orchestrator absorbs into a template
    /// fallback rather than surfacing to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlazaError::Connection { .. }
                | PlazaError::CircuitOpen { .. }
                | PlazaError::GenerationTimeout { .. }
                | PlazaError::Backend { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_failures_are_recoverable() {
        assert!(
            PlazaError::Connection {
                message: "refused".into(),
                source: None,
            }
            .is_recoverable()
        );
        assert!(
            PlazaError::CircuitOpen {
                retry_after: Duration::from_secs(30),
            }
            .is_recoverable()
        );
        assert!(
            PlazaError::GenerationTimeout {
                duration: Duration::from_secs(30),
            }
            .is_recoverable()
        );
        assert!(
            PlazaError::Backend {
                message: "500".into(),
                source: None,
            }
            .is_recoverable()
        );
    }

    #[test]
    fn hard_errors_are_not_recoverable() {
        assert!(!PlazaError::Config("bad".into()).is_recoverable());
        assert!(!PlazaError::Validation("bad pattern".into()).is_recoverable());
        assert!(!PlazaError::Overloaded("saturated".into()).is_recoverable());
        assert!(!PlazaError::Internal("oops".into()).is_recoverable());
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = PlazaError::CircuitOpen {
            retry_after: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("circuit open"));

        let err = PlazaError::Overloaded("limiter full".into());
        assert!(err.to_string().contains("limiter full"));
    }
}
