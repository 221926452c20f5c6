// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt rendering and cache-key normalization.
//!
//! The cache key deliberately ignores buyer name, history, and profile:
//! two buyers asking the same normalized question about the same listing
//! should share a cached reply.

use plaza_core::{ConversationRequest, Personality, TurnRole};

/// History turns beyond this tail are dropped from the prompt.
const HISTORY_TAIL: usize = 6;

/// Tone guidance injected into the prompt per personality.
fn tone_guidelines(personality: Personality) -> &'static str {
    match personality {
        Personality::Friendly => {
            "Responde con cercanía y entusiasmo, usando un tono cálido y algún signo de exclamación."
        }
        Personality::Professional => {
            "Responde con cortesía formal, trato de usted y frases completas."
        }
        Personality::Casual => "Responde de forma relajada y directa, como entre conocidos.",
        Personality::Firm => "Responde de forma educada pero escueta y sin regatear.",
    }
}

/// Render the full prompt sent to the backend.
pub fn render_prompt(request: &ConversationRequest) -> String {
    let mut prompt = String::with_capacity(512);

    prompt.push_str("Eres el vendedor de un artículo en un marketplace de segunda mano. ");
    prompt.push_str(tone_guidelines(request.personality));
    prompt.push_str("\nResponde en una o dos frases, sin inventar datos, y gestiona pagos solo por la plataforma.\n\n");

    prompt.push_str(&format!(
        "Artículo: {} | Precio: {} € | Estado: {}",
        request.product.name, request.product.price, request.product.condition
    ));
    if let Some(location) = &request.product.location {
        prompt.push_str(&format!(" | Zona: {location}"));
    }
    prompt.push('\n');

    let tail_start = request.history.len().saturating_sub(HISTORY_TAIL);
    for turn in &request.history[tail_start..] {
        let speaker = match turn.role {
            TurnRole::Buyer => "Comprador",
            TurnRole::Seller => "Vendedor",
        };
        prompt.push_str(&format!("{speaker}: {}\n", turn.text));
    }

    prompt.push_str(&format!("Comprador: {}\nVendedor:", request.message));
    prompt
}

/// Compute the normalized cache key for a request.
///
/// Lower-cased, punctuation-stripped, whitespace-collapsed message plus
/// the listing fields that change the answer: product name, price,
/// personality, and condition.
pub fn cache_key(request: &ConversationRequest) -> String {
    let normalized = normalize_text(&request.message);
    format!(
        "{normalized}|{}|{}|{}|{}",
        normalize_text(&request.product.name),
        request.product.price,
        request.personality,
        normalize_text(&request.product.condition),
    )
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use plaza_core::{ConversationTurn, ProductListing};

    fn request(message: &str) -> ConversationRequest {
        ConversationRequest::new(
            message,
            "Ana",
            ProductListing {
                name: "Bicicleta de montaña".into(),
                price: 400.0,
                condition: "usado".into(),
                location: Some("Madrid".into()),
            },
        )
    }

    #[test]
    fn punctuation_and_case_do_not_change_the_key() {
        let a = cache_key(&request("¿Está disponible?"));
        let b = cache_key(&request("esta disponible"));
        // The inverted question mark is stripped; accents are preserved.
        assert_ne!(a, b); // "está" vs "esta" differ by accent
        let c = cache_key(&request("¿¿Está   DISPONIBLE??"));
        assert_eq!(a, c);
    }

    #[test]
    fn key_varies_with_listing_fields() {
        let base = request("hola");
        let mut other = request("hola");
        other.product.price = 350.0;
        assert_ne!(cache_key(&base), cache_key(&other));

        let mut other = request("hola");
        other.personality = Personality::Firm;
        assert_ne!(cache_key(&base), cache_key(&other));
    }

    #[test]
    fn key_ignores_buyer_identity_and_history() {
        let mut a = request("hola");
        a.buyer_name = "Ana".into();
        let mut b = request("hola");
        b.buyer_name = "Luis".into();
        b.history = vec![ConversationTurn {
            role: TurnRole::Buyer,
            text: "¿sigue en venta?".into(),
        }];
        assert_eq!(cache_key(&a), cache_key(&b));
    }

    #[test]
    fn prompt_contains_listing_and_message() {
        let p = render_prompt(&request("¿Está disponible?"));
        assert!(p.contains("Bicicleta de montaña"));
        assert!(p.contains("400"));
        assert!(p.contains("¿Está disponible?"));
        assert!(p.ends_with("Vendedor:"));
    }

    #[test]
    fn prompt_keeps_only_the_history_tail() {
        let mut req = request("y ahora?");
        req.history = (0..10)
            .map(|i| ConversationTurn {
                role: TurnRole::Buyer,
                text: format!("turno-{i}"),
            })
            .collect();
        let p = render_prompt(&req);
        assert!(!p.contains("turno-3"));
        assert!(p.contains("turno-4"));
        assert!(p.contains("turno-9"));
    }

    #[test]
    fn prompt_tone_varies_by_personality() {
        let friendly = render_prompt(&request("hola"));
        let mut firm_req = request("hola");
        firm_req.personality = Personality::Firm;
        let firm = render_prompt(&firm_req);
        assert_ne!(friendly, firm);
    }
}
