// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plaza reply pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plaza configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlazaConfig {
    /// Orchestrator admission and retry settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Inference backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Risk validation thresholds and pattern weights.
    #[serde(default)]
    pub risk: RiskConfig,

    /// Template fallback settings.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Performance monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// How the orchestrator decides between generation and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Always attempt generation unless blocked or degraded.
    #[default]
    GenerationFirst,
    /// Never call the backend; every reply is a template.
    TemplateOnly,
    /// Route trivially classifiable messages (greetings) straight to
    /// templates, generate for the rest.
    Hybrid,
}

/// Orchestrator admission and retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Operation mode (generation_first, template_only, hybrid).
    #[serde(default)]
    pub mode: OperationMode,

    /// Size of the admission semaphore: maximum in-flight requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Default generation retry count when the request does not override it.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential retry backoff.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Overall per-request budget. Once exceeded, the request falls back
    /// immediately regardless of remaining retries.
    #[serde(default = "default_request_budget_ms")]
    pub request_budget_ms: u64,

    /// Health score below which new requests are routed straight to
    /// templates (degraded mode).
    #[serde(default = "default_degraded_floor")]
    pub degraded_health_floor: f64,

    /// Emit per-request debug metadata in response metadata maps.
    #[serde(default)]
    pub debug_metadata: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::default(),
            max_concurrent_requests: default_max_concurrent(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            request_budget_ms: default_request_budget_ms(),
            degraded_health_floor: default_degraded_floor(),
            debug_metadata: false,
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}

fn default_request_budget_ms() -> u64 {
    45_000
}

fn default_degraded_floor() -> f64 {
    40.0
}

/// Inference backend connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the local inference server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier to generate with.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature in (0, 2].
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling parameter.
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top-k sampling parameter.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Per-attempt generation timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of pooled backend connection permits.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Circuit breaker settings.
    #[serde(default)]
    pub breaker: BreakerConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
            pool_size: default_pool_size(),
            breaker: BreakerConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    256
}

fn default_top_p() -> f32 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_pool_size() -> usize {
    4
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Initial cooldown once the circuit opens.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Cap for the doubling cooldown.
    #[serde(default = "default_cooldown_cap_secs")]
    pub cooldown_cap_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            cooldown_cap_secs: default_cooldown_cap_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_cooldown_cap_secs() -> u64 {
    240
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of cached responses before LRU eviction.
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,

    /// Time-to-live for each cache entry.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_cache_entries(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_entries() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

/// Risk validation thresholds and pattern weights.
///
/// The *mechanism* (additive accumulation, cap at 100, critical patterns
/// dominate) is fixed; only the weights and thresholds are configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RiskConfig {
    /// Score at or above which text is unsafe and blocked.
    #[serde(default = "default_blocking_threshold")]
    pub blocking_threshold: u8,

    /// Score at or above which safe text is flagged for monitoring.
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: u8,

    /// Penalty per critical pattern match. Must alone cross the blocking
    /// threshold.
    #[serde(default = "default_critical_weight")]
    pub critical_weight: u8,

    /// Penalty when urgency language appears twice or more.
    #[serde(default = "default_urgency_weight")]
    pub urgency_weight: u8,

    /// Penalty for third-party pickup phrasing.
    #[serde(default = "default_third_party_weight")]
    pub third_party_weight: u8,

    /// Penalty for a new or unrated buyer profile.
    #[serde(default = "default_new_buyer_weight")]
    pub new_buyer_weight: u8,

    /// Penalty for a very low buyer rating.
    #[serde(default = "default_low_rating_weight")]
    pub low_rating_weight: u8,

    /// Penalty when the buyer is unusually far away.
    #[serde(default = "default_distance_weight")]
    pub distance_weight: u8,

    /// Maximum combined penalty from URL analysis.
    #[serde(default = "default_url_weight_max")]
    pub url_weight_max: u8,

    /// Buyer rating below this value is "very low".
    #[serde(default = "default_low_rating_threshold")]
    pub low_rating_threshold: f32,

    /// Distance beyond this many kilometres is suspicious.
    #[serde(default = "default_distance_km_threshold")]
    pub distance_km_threshold: f32,

    /// Account age below this many days counts as a new buyer.
    #[serde(default = "default_new_account_days")]
    pub new_account_days: u32,

    /// Domains considered part of the marketplace (links to these carry no
    /// penalty).
    #[serde(default = "default_marketplace_domains")]
    pub marketplace_domains: Vec<String>,

    /// Extra critical patterns compiled at startup in addition to the
    /// built-in set. Malformed patterns fail startup.
    #[serde(default)]
    pub extra_critical_patterns: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            blocking_threshold: default_blocking_threshold(),
            flag_threshold: default_flag_threshold(),
            critical_weight: default_critical_weight(),
            urgency_weight: default_urgency_weight(),
            third_party_weight: default_third_party_weight(),
            new_buyer_weight: default_new_buyer_weight(),
            low_rating_weight: default_low_rating_weight(),
            distance_weight: default_distance_weight(),
            url_weight_max: default_url_weight_max(),
            low_rating_threshold: default_low_rating_threshold(),
            distance_km_threshold: default_distance_km_threshold(),
            new_account_days: default_new_account_days(),
            marketplace_domains: default_marketplace_domains(),
            extra_critical_patterns: Vec::new(),
        }
    }
}

fn default_blocking_threshold() -> u8 {
    50
}

fn default_flag_threshold() -> u8 {
    25
}

fn default_critical_weight() -> u8 {
    50
}

fn default_urgency_weight() -> u8 {
    15
}

fn default_third_party_weight() -> u8 {
    20
}

fn default_new_buyer_weight() -> u8 {
    10
}

fn default_low_rating_weight() -> u8 {
    15
}

fn default_distance_weight() -> u8 {
    10
}

fn default_url_weight_max() -> u8 {
    50
}

fn default_low_rating_threshold() -> f32 {
    2.5
}

fn default_distance_km_threshold() -> f32 {
    300.0
}

fn default_new_account_days() -> u32 {
    7
}

fn default_marketplace_domains() -> Vec<String> {
    vec!["wallapop.com".to_string(), "es.wallapop.com".to_string()]
}

/// Template fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConfig {
    /// Fixed confidence attached to template replies. Kept below the
    /// generation confidence floor so callers can tell them apart.
    #[serde(default = "default_template_confidence")]
    pub template_confidence: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            template_confidence: default_template_confidence(),
        }
    }
}

fn default_template_confidence() -> f32 {
    0.6
}

/// Performance monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Ring buffer capacity for retained samples.
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: usize,

    /// Short rolling window.
    #[serde(default = "default_short_window_secs")]
    pub short_window_secs: u64,

    /// Long rolling window.
    #[serde(default = "default_long_window_secs")]
    pub long_window_secs: u64,

    /// Memory usage above this threshold drags the health score down.
    #[serde(default = "default_memory_threshold_mb")]
    pub memory_threshold_mb: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_capacity: default_sample_capacity(),
            short_window_secs: default_short_window_secs(),
            long_window_secs: default_long_window_secs(),
            memory_threshold_mb: default_memory_threshold_mb(),
        }
    }
}

fn default_sample_capacity() -> usize {
    8192
}

fn default_short_window_secs() -> u64 {
    300
}

fn default_long_window_secs() -> u64 {
    3600
}

fn default_memory_threshold_mb() -> u64 {
    512
}
