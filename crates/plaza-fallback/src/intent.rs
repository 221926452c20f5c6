// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coarse message-intent classification for template selection.
//!
//! Heuristic rules over the buyer message, Spanish and English. Zero
//! cost, no network, no latency: this runs on every fallback and must
//! never become a bottleneck.

/// Coarse intents a template reply can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageIntent {
    /// A bare greeting with no question.
    Greeting,
    /// "Is it still available?"
    Availability,
    /// Asking about or negotiating the price.
    PriceQuestion,
    /// Anything we cannot classify.
    Unrecognized,
}

impl std::fmt::Display for MessageIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageIntent::Greeting => write!(f, "greeting"),
            MessageIntent::Availability => write!(f, "availability"),
            MessageIntent::PriceQuestion => write!(f, "price_question"),
            MessageIntent::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Greeting phrases (exact match after trimming punctuation, case-insensitive).
const GREETING_EXACT: &[&str] = &[
    "hola", "buenas", "buenos dias", "buenos días", "buenas tardes", "buenas noches",
    "que tal", "qué tal", "hello", "hi", "hey", "good morning", "good afternoon",
];

/// Availability phrases (contains, case-insensitive).
const AVAILABILITY_PATTERNS: &[&str] = &[
    "disponible", "sigue en venta", "sigue a la venta", "lo tienes", "la tienes",
    "todavia esta", "todavía está", "still available", "still for sale", "still have",
    "aun lo tienes", "aún lo tienes",
];

/// Price phrases (contains, case-insensitive).
const PRICE_PATTERNS: &[&str] = &[
    "precio", "cuanto", "cuánto", "how much", "ultimo precio", "último precio",
    "negociable", "rebaja", "descuento", "discount", "lowest price", "best price",
    "te doy", "te ofrezco", "i'll give you", "would you take",
];

/// Classify a buyer message into a coarse intent.
///
/// Price questions win over availability when both match ("¿está
/// disponible? ¿cuánto es lo último?" is a negotiation).
pub fn classify(message: &str) -> MessageIntent {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return MessageIntent::Unrecognized;
    }

    let lower = trimmed.to_lowercase();
    let stripped: String = lower
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let stripped = stripped.trim();

    if GREETING_EXACT.iter().any(|g| stripped == *g) {
        return MessageIntent::Greeting;
    }

    if PRICE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return MessageIntent::PriceQuestion;
    }

    if AVAILABILITY_PATTERNS.iter().any(|p| lower.contains(p)) {
        return MessageIntent::Availability;
    }

    MessageIntent::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_greetings() {
        assert_eq!(classify("Hola"), MessageIntent::Greeting);
        assert_eq!(classify("buenas!"), MessageIntent::Greeting);
        assert_eq!(classify("¡Buenos días!"), MessageIntent::Greeting);
        assert_eq!(classify("hey"), MessageIntent::Greeting);
    }

    #[test]
    fn classifies_availability() {
        assert_eq!(classify("¿Está disponible?"), MessageIntent::Availability);
        assert_eq!(classify("¿sigue en venta la bici?"), MessageIntent::Availability);
        assert_eq!(classify("is it still available?"), MessageIntent::Availability);
    }

    #[test]
    fn classifies_price_questions() {
        assert_eq!(classify("¿Cuánto es lo último?"), MessageIntent::PriceQuestion);
        assert_eq!(classify("es negociable el precio?"), MessageIntent::PriceQuestion);
        assert_eq!(classify("te doy 300 y lo recojo hoy"), MessageIntent::PriceQuestion);
        assert_eq!(classify("how much?"), MessageIntent::PriceQuestion);
    }

    #[test]
    fn price_wins_over_availability() {
        assert_eq!(
            classify("¿está disponible? ¿cuánto es lo último?"),
            MessageIntent::PriceQuestion
        );
    }

    #[test]
    fn greeting_with_question_is_not_a_greeting() {
        assert_eq!(classify("hola, ¿está disponible?"), MessageIntent::Availability);
    }

    #[test]
    fn unknown_text_is_unrecognized() {
        assert_eq!(classify("¿me lo puedes enviar a Francia?"), MessageIntent::Unrecognized);
        assert_eq!(classify(""), MessageIntent::Unrecognized);
        assert_eq!(classify("   "), MessageIntent::Unrecognized);
    }

    #[test]
    fn intent_display() {
        assert_eq!(MessageIntent::Greeting.to_string(), "greeting");
        assert_eq!(MessageIntent::PriceQuestion.to_string(), "price_question");
    }
}
