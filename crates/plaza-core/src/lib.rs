// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plaza reply pipeline.
//!
//! This crate provides the shared request/response types, the pipeline
//! error enum, and the inference backend adapter trait. Every other Plaza
//! crate builds on these definitions.

pub mod backend;
pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use backend::{BackendHealth, GenerationOutput, GenerationParams, InferenceBackend};
pub use error::PlazaError;
pub use types::{
    BuyerProfile, ConversationRequest, ConversationResponse, ConversationTurn, Personality,
    ProductListing, ResponseSource, TimingBreakdown, TurnRole, ValidationVerdict,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_has_all_variants() {
        // Verify all 8 error variants exist and can be constructed.
        let _config = PlazaError::Config("test".into());
        let _connection = PlazaError::Connection {
            message: "test".into(),
            source: None,
        };
        let _circuit = PlazaError::CircuitOpen {
            retry_after: std::time::Duration::from_secs(30),
        };
        let _timeout = PlazaError::GenerationTimeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _validation = PlazaError::Validation("test".into());
        let _backend = PlazaError::Backend {
            message: "test".into(),
            source: None,
        };
        let _overloaded = PlazaError::Overloaded("test".into());
        let _internal = PlazaError::Internal("test".into());
    }

    #[test]
    fn backend_trait_is_object_safe() {
        fn _takes_dyn(_b: &dyn InferenceBackend) {}
    }
}
