// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compiled risk pattern sets.
//!
//! Patterns cover Spanish and English phrasing since the marketplace
//! audience mixes both. All patterns compile once at startup; a malformed
//! pattern (built-in or configured) is a fatal configuration error, never
//! a per-request failure.

use plaza_core::PlazaError;
use regex::Regex;

/// A critical pattern: any single match blocks the exchange outright.
#[derive(Debug)]
pub struct CriticalPattern {
    /// Tag recorded in the verdict's critical violation list.
    pub tag: &'static str,
    pub regex: Regex,
}

/// Built-in critical pattern sources, grouped by violation tag.
const CRITICAL_SOURCES: &[(&str, &str)] = &[
    (
        "payment_redirect",
        r"(?i)\b(pago por adelantado|pagar? por adelantado|adelanta(r|me) el pago|env[ií]a(me)? (el )?dinero (antes|primero)|send (me )?(the )?money (first|before)|pay (me )?in advance|advance payment|dep[oó]sito previo)\b",
    ),
    (
        "identity_document",
        r"(?i)\b(foto (de tu|del) (dni|documento|pasaporte)|n[uú]mero de (dni|cuenta|tarjeta)|m[aá]ndame tu dni|send (me )?your (id|passport|document)|copy of your (id|passport)|social security number|seguridad social)\b",
    ),
    (
        "offplatform_payment",
        r"(?i)\b(western union|moneygram|giro postal|giro internacional|wire transfer|transferencia (internacional|fuera)|money order|hawala)\b",
    ),
    (
        "crypto_payment",
        r"(?i)\b(bitcoin|btc|ethereum|litecoin|usdt|tether|criptomonedas?|crypto(currency|currencies)?|pago en cripto)\b",
    ),
];

/// Urgency phrasing; risk only accrues when repeated.
const URGENCY_SOURCE: &str = r"(?i)\b(urgente(mente)?|urgent(ly)?|hoy mismo|ahora mismo|right now|ya mismo|inmediatamente|immediately|asap|cuanto antes|antes de (esta noche|ma[nñ]ana))\b";

/// Third-party pickup phrasing.
const THIRD_PARTY_SOURCE: &str = r"(?i)\b(mi (primo|hermano|amigo|socio|chofer|transportista|mensajero) (lo|la)? ?(recoge|recoger[aá]|pasar[aá])|otra persona (lo|la)? ?recoger[aá]|mandar[eé] a alguien|env[ií]o un mensajero|my (cousin|brother|friend|agent|courier|driver) (will )?(pick|collect)|someone else will (pick|collect)|a third party)\b";

/// Embedded link detector (explicit scheme or `www.` prefix).
const URL_SOURCE: &str = r#"(?i)\b((?:https?://|www\.)[^\s<>"']+)"#;

/// All compiled pattern sets used by the validator.
#[derive(Debug)]
pub struct RiskPatterns {
    pub critical: Vec<CriticalPattern>,
    pub urgency: Regex,
    pub third_party: Regex,
    pub url: Regex,
}

impl RiskPatterns {
    /// Compiles the built-in pattern sets plus any configured extras.
    ///
    /// Extra patterns are tagged `custom` in verdicts.
    pub fn compile(extra_critical: &[String]) -> Result<Self, PlazaError> {
        let mut critical = Vec::with_capacity(CRITICAL_SOURCES.len() + extra_critical.len());
        for (tag, source) in CRITICAL_SOURCES {
            critical.push(CriticalPattern {
                tag,
                regex: compile(source)?,
            });
        }
        for source in extra_critical {
            critical.push(CriticalPattern {
                tag: "custom",
                regex: compile(source)?,
            });
        }

        Ok(Self {
            critical,
            urgency: compile(URGENCY_SOURCE)?,
            third_party: compile(THIRD_PARTY_SOURCE)?,
            url: compile(URL_SOURCE)?,
        })
    }
}

fn compile(source: &str) -> Result<Regex, PlazaError> {
    Regex::new(source).map_err(|e| PlazaError::Validation(format!("malformed pattern `{source}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_patterns_compile() {
        let patterns = RiskPatterns::compile(&[]).unwrap();
        assert_eq!(patterns.critical.len(), 4);
    }

    #[test]
    fn extra_patterns_are_appended() {
        let patterns =
            RiskPatterns::compile(&[r"(?i)\bgift cards?\b".to_string()]).unwrap();
        assert_eq!(patterns.critical.len(), 5);
        assert_eq!(patterns.critical[4].tag, "custom");
        assert!(patterns.critical[4].regex.is_match("Can you pay with gift cards?"));
    }

    #[test]
    fn malformed_extra_pattern_fails_startup() {
        let err = RiskPatterns::compile(&["(unclosed".to_string()]).unwrap_err();
        assert!(matches!(err, PlazaError::Validation(_)));
    }

    #[test]
    fn offplatform_patterns_match_spanish_and_english() {
        let patterns = RiskPatterns::compile(&[]).unwrap();
        let offplatform = &patterns.critical[2];
        assert!(offplatform.regex.is_match("¿Acepta pago por Western Union?"));
        assert!(offplatform.regex.is_match("I can send a wire transfer"));
        assert!(!offplatform.regex.is_match("¿Está disponible?"));
    }

    #[test]
    fn urgency_detects_repeats() {
        let patterns = RiskPatterns::compile(&[]).unwrap();
        let text = "Lo necesito urgente, urgente, hoy mismo";
        assert!(patterns.urgency.find_iter(text).count() >= 2);
    }

    #[test]
    fn url_pattern_finds_links() {
        let patterns = RiskPatterns::compile(&[]).unwrap();
        let text = "mira esto https://example.com/pago y www.bit.ly/abc";
        let urls: Vec<_> = patterns.url.find_iter(text).map(|m| m.as_str()).collect();
        assert_eq!(urls.len(), 2);
    }
}
