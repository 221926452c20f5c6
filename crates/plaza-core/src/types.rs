// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request, response, and verdict types shared across the Plaza pipeline.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reply tone used when rendering prompts and selecting templates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Friendly,
    Professional,
    Casual,
    Firm,
}

/// Who spoke a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    Buyer,
    Seller,
}

/// A single prior turn in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
}

/// The listing the buyer is asking about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    pub name: String,
    pub price: f64,
    /// Free-form condition string as it appears on the listing ("nuevo", "como nuevo", ...).
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Marketplace reputation data for the buyer, when the caller has it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerProfile {
    pub rating_count: u32,
    pub avg_rating: f32,
    pub account_age_days: u32,
    #[serde(default)]
    pub distance_km: Option<f32>,
    #[serde(default)]
    pub prior_purchases: u32,
}

/// One buyer message handed to the pipeline by the conversation engine.
///
/// Immutable once constructed; each call owns its request exclusively.
#[derive(Debug, Clone)]
pub struct ConversationRequest {
    pub message: String,
    pub buyer_name: String,
    pub product: ProductListing,
    pub buyer_profile: Option<BuyerProfile>,
    /// Bounded history tail, oldest first. The pipeline does not interpret
    /// conversation state beyond rendering these into the prompt.
    pub history: Vec<ConversationTurn>,
    pub personality: Personality,
    /// Requests outbound validation of generated text. The inbound safety
    /// gate runs regardless of this flag.
    pub validation_required: bool,
    pub max_retries: u32,
}

impl ConversationRequest {
    pub fn new(
        message: impl Into<String>,
        buyer_name: impl Into<String>,
        product: ProductListing,
    ) -> Self {
        Self {
            message: message.into(),
            buyer_name: buyer_name.into(),
            product,
            buyer_profile: None,
            history: Vec::new(),
            personality: Personality::default(),
            validation_required: true,
            max_retries: 3,
        }
    }

    pub fn with_profile(mut self, profile: BuyerProfile) -> Self {
        self.buyer_profile = Some(profile);
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// How the final response text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Model-generated text that passed outbound validation.
    Generated,
    /// Pre-authored template (backend failure, degraded mode, or unsafe generation).
    Template,
    /// Safety message: the inbound message crossed the blocking threshold.
    Blocked,
}

/// Verdict produced by the risk validator for a piece of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_safe: bool,
    /// Additive risk score, capped at 100.
    pub risk_score: u8,
    /// Tags for contextual risk factors that matched.
    pub risk_factors: Vec<String>,
    /// Tags for critical violations; any single one blocks.
    pub critical_violations: Vec<String>,
    pub recommendations: Vec<String>,
    pub validation_time_ms: u64,
}

impl ValidationVerdict {
    /// A verdict for trivially safe text (used for pre-authored templates
    /// before re-validation).
    pub fn safe() -> Self {
        Self {
            is_safe: true,
            risk_score: 0,
            risk_factors: Vec::new(),
            critical_violations: Vec::new(),
            recommendations: Vec::new(),
            validation_time_ms: 0,
        }
    }
}

/// Per-stage timing for one request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimingBreakdown {
    pub generation_ms: u64,
    pub validation_ms: u64,
    pub total_ms: u64,
}

/// The reply handed back to the conversation engine.
///
/// Produced exactly once per request and immutable afterwards. The
/// `risk_score` always reflects the validator's verdict on the text in
/// `text` -- never on discarded pre-fallback text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub request_id: String,
    pub text: String,
    /// Confidence in [0, 1]. Generated replies derive this from
    /// latency-per-token; template replies use a fixed constant below the
    /// generation floor.
    pub confidence: f32,
    pub risk_score: u8,
    pub source: ResponseSource,
    pub timing: TimingBreakdown,
    pub personality: Personality,
    pub model: String,
    pub token_count: u32,
    pub verdict: ValidationVerdict,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationResponse {
    /// Starts a response with a fresh request id and timestamp.
    pub fn new(
        text: impl Into<String>,
        source: ResponseSource,
        personality: Personality,
    ) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            confidence: 0.0,
            risk_score: 0,
            source,
            timing: TimingBreakdown::default(),
            personality,
            model: String::new(),
            token_count: 0,
            verdict: ValidationVerdict::safe(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}
