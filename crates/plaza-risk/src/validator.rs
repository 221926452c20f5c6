// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The risk validator: a pure scoring function over text and an optional
//! buyer profile.
//!
//! Scoring is additive and capped at 100. Critical pattern matches each
//! add a penalty that alone crosses the blocking threshold; contextual
//! factors accumulate but individually stay below it. No network, no
//! cache, no hidden state: identical inputs always produce identical
//! verdicts.

use std::time::Instant;

use plaza_config::RiskConfig;
use plaza_core::{BuyerProfile, PlazaError, ValidationVerdict};
use tracing::debug;

use crate::patterns::RiskPatterns;
use crate::urls;

/// Stateless risk scorer for inbound buyer messages and generated replies.
#[derive(Debug)]
pub struct RiskValidator {
    patterns: RiskPatterns,
    config: RiskConfig,
}

impl RiskValidator {
    /// Compiles pattern sets from the risk configuration.
    ///
    /// Fails fast with [`PlazaError::Validation`] on a malformed pattern;
    /// this never happens per-request.
    pub fn new(config: RiskConfig) -> Result<Self, PlazaError> {
        let patterns = RiskPatterns::compile(&config.extra_critical_patterns)?;
        Ok(Self { patterns, config })
    }

    /// The score at or above which text is blocked.
    pub fn blocking_threshold(&self) -> u8 {
        self.config.blocking_threshold
    }

    /// The score at or above which safe text is flagged for monitoring.
    pub fn flag_threshold(&self) -> u8 {
        self.config.flag_threshold
    }

    /// Score `text` (and the buyer profile, when available) and return a
    /// fresh verdict.
    pub fn validate(&self, text: &str, profile: Option<&BuyerProfile>) -> ValidationVerdict {
        let started = Instant::now();
        let mut score: u32 = 0;
        let mut risk_factors = Vec::new();
        let mut critical_violations = Vec::new();
        let mut recommendations = Vec::new();

        // Critical patterns dominate: each match adds the full critical
        // weight and is recorded as a violation.
        for pattern in &self.patterns.critical {
            if pattern.regex.is_match(text) {
                score += u32::from(self.config.critical_weight);
                critical_violations.push(pattern.tag.to_string());
            }
        }
        if !critical_violations.is_empty() {
            recommendations
                .push("do not continue this exchange; report the buyer".to_string());
        }

        // Contextual factors accumulate below the blocking threshold.
        if self.patterns.urgency.find_iter(text).count() >= 2 {
            score += u32::from(self.config.urgency_weight);
            risk_factors.push("repeated_urgency".to_string());
        }

        if self.patterns.third_party.is_match(text) {
            score += u32::from(self.config.third_party_weight);
            risk_factors.push("third_party_pickup".to_string());
        }

        if let Some(profile) = profile {
            if profile.rating_count == 0
                || profile.account_age_days < self.config.new_account_days
            {
                score += u32::from(self.config.new_buyer_weight);
                risk_factors.push("new_buyer".to_string());
            }

            // A low average only means something once ratings exist; it
            // accumulates independently of account age.
            if profile.rating_count > 0 && profile.avg_rating < self.config.low_rating_threshold {
                score += u32::from(self.config.low_rating_weight);
                risk_factors.push("low_buyer_rating".to_string());
            }

            if let Some(distance) = profile.distance_km
                && distance > self.config.distance_km_threshold
            {
                score += u32::from(self.config.distance_weight);
                risk_factors.push("distant_buyer".to_string());
            }
        }

        // Embedded link analysis.
        let findings = urls::analyze_urls(
            text,
            &self.patterns.url,
            &self.config.marketplace_domains,
            self.config.url_weight_max,
        );
        if findings.penalty > 0 {
            score += u32::from(findings.penalty);
            risk_factors.extend(findings.factors);
            recommendations.push("do not open links sent by buyers".to_string());
        }

        let risk_score = score.min(100) as u8;
        let is_safe = risk_score < self.config.blocking_threshold;

        if is_safe && risk_score >= self.config.flag_threshold {
            recommendations.push("monitor this conversation closely".to_string());
        }

        if !is_safe {
            debug!(
                risk_score,
                violations = critical_violations.len(),
                "text crossed the blocking threshold"
            );
        }

        ValidationVerdict {
            is_safe,
            risk_score,
            risk_factors,
            critical_violations,
            recommendations,
            validation_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_config::RiskConfig;

    fn validator() -> RiskValidator {
        RiskValidator::new(RiskConfig::default()).unwrap()
    }

    fn risky_profile() -> BuyerProfile {
        BuyerProfile {
            rating_count: 0,
            avg_rating: 0.0,
            account_age_days: 1,
            distance_km: Some(900.0),
            prior_purchases: 0,
        }
    }

    #[test]
    fn western_union_is_blocked() {
        let v = validator().validate("¿Acepta pago por Western Union?", None);
        assert!(!v.is_safe);
        assert!(v.risk_score >= 50);
        assert_eq!(v.critical_violations, vec!["offplatform_payment"]);
    }

    #[test]
    fn plain_availability_question_is_safe() {
        let v = validator().validate("Hola, ¿está disponible?", None);
        assert!(v.is_safe);
        assert_eq!(v.risk_score, 0);
        assert!(v.critical_violations.is_empty());
    }

    #[test]
    fn validation_is_idempotent() {
        let validator = validator();
        let profile = risky_profile();
        let a = validator.validate("urgente urgente, mi primo lo recoge", Some(&profile));
        let b = validator.validate("urgente urgente, mi primo lo recoge", Some(&profile));
        assert_eq!(a.risk_score, b.risk_score);
        assert_eq!(a.is_safe, b.is_safe);
        assert_eq!(a.risk_factors, b.risk_factors);
        assert_eq!(a.critical_violations, b.critical_violations);
    }

    #[test]
    fn contextual_factors_accumulate_below_blocking() {
        // Urgency repeated (+15) alone stays safe.
        let v = validator().validate("urgente, lo necesito urgente", None);
        assert!(v.is_safe);
        assert_eq!(v.risk_score, 15);
        assert_eq!(v.risk_factors, vec!["repeated_urgency"]);
    }

    #[test]
    fn urgency_once_is_not_a_factor() {
        let v = validator().validate("es urgente para mí", None);
        assert_eq!(v.risk_score, 0);
        assert!(v.risk_factors.is_empty());
    }

    #[test]
    fn third_party_pickup_flagged() {
        let v = validator().validate("mi primo lo recoge mañana", None);
        assert!(v.is_safe);
        assert_eq!(v.risk_score, 20);
        assert_eq!(v.risk_factors, vec!["third_party_pickup"]);
    }

    #[test]
    fn new_buyer_and_distance_accumulate() {
        let v = validator().validate("hola", Some(&risky_profile()));
        assert!(v.is_safe);
        // new_buyer (+10) + distant_buyer (+10)
        assert_eq!(v.risk_score, 20);
        assert!(v.risk_factors.contains(&"new_buyer".to_string()));
        assert!(v.risk_factors.contains(&"distant_buyer".to_string()));
    }

    #[test]
    fn low_rating_counts_when_established() {
        let profile = BuyerProfile {
            rating_count: 12,
            avg_rating: 1.8,
            account_age_days: 400,
            distance_km: None,
            prior_purchases: 3,
        };
        let v = validator().validate("hola", Some(&profile));
        assert_eq!(v.risk_score, 15);
        assert_eq!(v.risk_factors, vec!["low_buyer_rating"]);
    }

    #[test]
    fn young_account_with_low_ratings_accumulates_both_factors() {
        let profile = BuyerProfile {
            rating_count: 5,
            avg_rating: 1.5,
            account_age_days: 3,
            distance_km: None,
            prior_purchases: 1,
        };
        let v = validator().validate("hola", Some(&profile));
        // new_buyer (+10) + low_buyer_rating (+15)
        assert_eq!(v.risk_score, 25);
        assert!(v.risk_factors.contains(&"new_buyer".to_string()));
        assert!(v.risk_factors.contains(&"low_buyer_rating".to_string()));
    }

    #[test]
    fn unrated_account_carries_no_rating_factor() {
        // avg_rating defaults to 0.0 when nobody has rated yet; that must
        // not read as a bad reputation.
        let v = validator().validate("hola", Some(&BuyerProfile {
            rating_count: 0,
            avg_rating: 0.0,
            account_age_days: 90,
            distance_km: None,
            prior_purchases: 0,
        }));
        assert_eq!(v.risk_score, 10);
        assert_eq!(v.risk_factors, vec!["new_buyer"]);
    }

    #[test]
    fn score_caps_at_100() {
        let text = "pago por adelantado via western union en bitcoin, \
                    mándame tu dni, urgente urgente, mi primo lo recoge, \
                    paga en http://203.0.113.9/x";
        let v = validator().validate(text, Some(&risky_profile()));
        assert_eq!(v.risk_score, 100);
        assert!(!v.is_safe);
        assert!(v.critical_violations.len() >= 3);
    }

    #[test]
    fn flagged_band_gets_monitoring_recommendation() {
        // third_party (+20) + new_buyer (+10) = 30: safe but flagged.
        let v = validator().validate("mi primo lo recoge", Some(&BuyerProfile {
            rating_count: 0,
            avg_rating: 0.0,
            account_age_days: 2,
            distance_km: None,
            prior_purchases: 0,
        }));
        assert!(v.is_safe);
        assert!(v.risk_score >= 25 && v.risk_score < 50);
        assert!(
            v.recommendations
                .iter()
                .any(|r| r.contains("monitor"))
        );
    }

    #[test]
    fn single_critical_blocks_regardless_of_clean_context() {
        let profile = BuyerProfile {
            rating_count: 200,
            avg_rating: 4.9,
            account_age_days: 2000,
            distance_km: Some(2.0),
            prior_purchases: 80,
        };
        let v = validator().validate("te pago en bitcoin si quieres", Some(&profile));
        assert!(!v.is_safe);
        assert!(v.risk_score >= 50);
    }
}
