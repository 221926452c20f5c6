// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic template responder for the Plaza reply pipeline.
//!
//! Used when generation is skipped, fails, or is blocked. Selection is
//! deterministic given the same intent and rotation index; the rotation
//! index is per-process so repeated calls do not return the identical
//! phrase.

pub mod intent;
pub mod templates;

use std::sync::atomic::{AtomicUsize, Ordering};

use plaza_config::FallbackConfig;
use plaza_core::{ConversationRequest, Personality};
use tracing::debug;

pub use intent::{MessageIntent, classify};

/// A rendered template reply.
#[derive(Debug, Clone)]
pub struct TemplateReply {
    pub text: String,
    /// Fixed constant below the generation confidence floor.
    pub confidence: f32,
    pub intent: MessageIntent,
}

/// Template-based responder with process-wide phrase rotation.
pub struct FallbackGenerator {
    rotation: AtomicUsize,
    template_confidence: f32,
}

impl FallbackGenerator {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            rotation: AtomicUsize::new(0),
            template_confidence: config.template_confidence,
        }
    }

    /// Produce a reply for a message the backend could not (or should not)
    /// answer. Classifies intent and rotates through the matching phrases.
    pub fn respond(&self, request: &ConversationRequest) -> TemplateReply {
        let intent = intent::classify(&request.message);
        let phrases = templates::phrases(request.personality, intent);
        let text = templates::render(self.next(phrases), &request.product);

        debug!(intent = %intent, personality = %request.personality, "template reply selected");

        TemplateReply {
            text,
            confidence: self.template_confidence,
            intent,
        }
    }

    /// Produce the safety message for a blocked exchange.
    ///
    /// Never parameterized by buyer text: a blocked reply must not echo
    /// injected content.
    pub fn safety_response(&self, personality: Personality) -> TemplateReply {
        let phrases = templates::safety_phrases(personality);
        TemplateReply {
            text: self.next(phrases).to_string(),
            confidence: self.template_confidence,
            intent: MessageIntent::Unrecognized,
        }
    }

    fn next<'a>(&self, phrases: &[&'a str]) -> &'a str {
        let idx = self.rotation.fetch_add(1, Ordering::Relaxed);
        phrases[idx % phrases.len()]
    }
}
