// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-authored template phrases keyed by personality and intent.
//!
//! Templates interpolate only `{product}` and `{price}` from the listing;
//! buyer-supplied free text is never echoed, so injected content cannot
//! leak into a reply.

use plaza_core::{Personality, ProductListing};

use crate::intent::MessageIntent;

/// Template phrases for a personality/intent pair.
///
/// Every pair has at least two phrases so rotation produces visible
/// variety for repeated calls.
pub fn phrases(personality: Personality, intent: MessageIntent) -> &'static [&'static str] {
    use MessageIntent::*;
    use Personality::*;

    match (personality, intent) {
        (Friendly, Greeting) => &[
            "¡Hola! Gracias por escribir. ¿Te interesa {product}?",
            "¡Buenas! Encantado de saludarte. {product} sigue disponible, pregúntame lo que quieras.",
            "¡Hola! ¿En qué te puedo ayudar con {product}?",
        ],
        (Friendly, Availability) => &[
            "¡Sí! {product} sigue disponible. ¿Quieres que hablemos?",
            "Sigue a la venta, sí. Si te interesa {product} me dices y lo vemos.",
            "¡Disponible! Puedo resolverte cualquier duda sobre {product}.",
        ],
        (Friendly, PriceQuestion) => &[
            "El precio de {product} es {price} €. ¡Está en muy buen estado!",
            "Lo tengo publicado en {price} €. Si lo quieres, seguro que nos entendemos.",
            "Pido {price} € por {product}. Dime si te encaja.",
        ],
        (Friendly, Unrecognized) => &[
            "¡Gracias por tu mensaje! Cuéntame qué te gustaría saber sobre {product}.",
            "Ahora mismo no puedo extenderme, pero pregúntame lo que quieras sobre {product}.",
        ],
        (Professional, Greeting) => &[
            "Buenas. Gracias por su interés en {product}. Quedo a su disposición.",
            "Hola, encantado. Si desea información sobre {product}, pregunte sin compromiso.",
        ],
        (Professional, Availability) => &[
            "El artículo {product} continúa disponible. Puedo ampliar detalles si lo necesita.",
            "Sí, sigue a la venta. Dispongo de fotos adicionales de {product} si le interesan.",
        ],
        (Professional, PriceQuestion) => &[
            "El precio publicado de {product} es {price} €. El pago se gestiona por la plataforma.",
            "Se ofrece por {price} €. La transacción se realiza íntegramente por la plataforma.",
        ],
        (Professional, Unrecognized) => &[
            "Gracias por su mensaje. Indíqueme qué desea saber sobre {product} y le respondo en breve.",
            "He recibido su consulta sobre {product}; le contesto con detalle en cuanto pueda.",
        ],
        (Casual, Greeting) => &[
            "¡Hey! ¿Qué tal? ¿Te mola {product}?",
            "¡Buenas! Tú dirás, {product} sigue por aquí.",
        ],
        (Casual, Availability) => &[
            "Sí, sigue disponible. Si lo quieres, es tuyo.",
            "Aún lo tengo. {product} busca casa nueva.",
        ],
        (Casual, PriceQuestion) => &[
            "Van {price} € por {product}. Sin rollos.",
            "Lo dejo en {price} €, que ya está bien puesto de precio.",
        ],
        (Casual, Unrecognized) => &[
            "¡Buenas! Dime qué quieres saber de {product} y te cuento.",
            "Ando liado ahora, pero pregunta lo que sea de {product}.",
        ],
        (Firm, Greeting) => &[
            "Hola. Si te interesa {product}, dime.",
            "Buenas. {product} está disponible; tú dirás.",
        ],
        (Firm, Availability) => &[
            "Sigue disponible. El primero que lo reserve se lo lleva.",
            "Sí, está a la venta. Sin reservas sin compromiso.",
        ],
        (Firm, PriceQuestion) => &[
            "El precio es {price} € y no es negociable.",
            "Son {price} €. El precio ya está ajustado.",
        ],
        (Firm, Unrecognized) => &[
            "Recibido. Concreta tu pregunta sobre {product} y te contesto.",
            "Dime exactamente qué necesitas saber de {product}.",
        ],
    }
}

/// Safety messages for blocked exchanges.
///
/// These decline without referencing anything the buyer wrote and steer
/// the conversation back to the platform's payment flow.
pub fn safety_phrases(personality: Personality) -> &'static [&'static str] {
    use Personality::*;
    match personality {
        Friendly => &[
            "Lo siento, solo gestiono pagos y envíos a través de la plataforma. ¡Gracias por entenderlo!",
            "Prefiero hacerlo todo por la plataforma, que nos protege a los dos. ¡Gracias!",
        ],
        Professional => &[
            "Por seguridad, todas las gestiones de pago y envío se realizan exclusivamente por la plataforma.",
            "No realizo operaciones fuera de la plataforma. Gracias por su comprensión.",
        ],
        Casual => &[
            "Uy, eso no. Todo por la app, que es lo seguro para los dos.",
            "Paso de líos: pagos y envíos solo por la plataforma.",
        ],
        Firm => &[
            "No. Únicamente acepto el pago por la plataforma.",
            "Solo opero dentro de la plataforma. No insistas, por favor.",
        ],
    }
}

/// Interpolate `{product}` and `{price}` from the listing.
pub fn render(template: &str, product: &ProductListing) -> String {
    template
        .replace("{product}", &product.name)
        .replace("{price}", &format_price(product.price))
}

/// Prices render without trailing ".0" when whole.
fn format_price(price: f64) -> String {
    if (price.fract()).abs() < f64::EPSILON {
        format!("{}", price as i64)
    } else {
        format!("{price:.2}")
    }
}
