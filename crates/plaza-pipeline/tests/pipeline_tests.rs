// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end orchestrator tests against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use plaza_config::{OperationMode, PlazaConfig};
use plaza_core::{
    ConversationRequest, InferenceBackend, PlazaError, ProductListing, ResponseSource,
};
use plaza_monitor::PerformanceSample;
use plaza_pipeline::Orchestrator;
use plaza_test_utils::MockBackend;

fn listing() -> ProductListing {
    ProductListing {
        name: "Bicicleta de montaña".into(),
        price: 400.0,
        condition: "usado".into(),
        location: Some("Madrid".into()),
    }
}

fn request(message: &str) -> ConversationRequest {
    ConversationRequest::new(message, "Ana", listing())
}

fn orchestrator(config: &PlazaConfig, backend: &Arc<MockBackend>) -> Orchestrator {
    Orchestrator::new(config, Arc::clone(backend) as Arc<dyn InferenceBackend>)
        .expect("valid config")
}

#[tokio::test]
async fn scam_payment_message_is_blocked_without_touching_the_backend() {
    let backend = Arc::new(MockBackend::new());
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    let response = pipeline
        .generate(request("¿Acepta pago por Western Union? Es urgente."))
        .await
        .unwrap();

    assert_eq!(response.source, ResponseSource::Blocked);
    assert!(response.risk_score >= 50, "risk: {}", response.risk_score);
    assert!(!response.verdict.is_safe);
    assert!(
        !response.text.to_lowercase().contains("western union"),
        "blocked reply must not echo the buyer message: {}",
        response.text
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn identical_questions_share_one_generation() {
    let backend = Arc::new(MockBackend::with_responses(vec![
        "¡Sí, sigue disponible!".to_string(),
    ]));
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    let first = pipeline
        .generate(request("¿Está disponible?"))
        .await
        .unwrap();
    assert_eq!(first.source, ResponseSource::Generated);

    // Same question modulo punctuation, case, and whitespace.
    let second = pipeline
        .generate(request("está   DISPONIBLE!!"))
        .await
        .unwrap();

    assert_eq!(second.text, first.text);
    assert_eq!(second.source, ResponseSource::Generated);
    assert_eq!(second.metadata.get("cache").map(String::as_str), Some("hit"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_requests_never_exceed_the_admission_bound() {
    let mut config = PlazaConfig::default();
    config.pipeline.max_concurrent_requests = 5;
    config.backend.pool_size = 8;

    let backend = Arc::new(MockBackend::new().with_delay(Duration::from_millis(50)));
    let pipeline = Arc::new(orchestrator(&config, &backend));

    let mut handles = Vec::new();
    for i in 0..20 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            pipeline
                .generate_with_deadline(
                    request(&format!("¿Está disponible? pregunta {i}")),
                    Duration::from_secs(10),
                )
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert!(
        backend.max_in_flight() <= 5,
        "peak in-flight was {}",
        backend.max_in_flight()
    );
}

#[tokio::test]
async fn open_circuit_stops_reaching_the_backend() {
    let backend = Arc::new(MockBackend::always_failing());
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    // Default breaker threshold is 3 consecutive failures; one attempt
    // per request.
    for _ in 0..3 {
        let response = pipeline
            .generate(request("¿Está disponible?").with_max_retries(0))
            .await
            .unwrap();
        assert_eq!(response.source, ResponseSource::Template);
    }
    assert_eq!(backend.calls(), 3);

    // Circuit is open: further requests fall back without a backend call.
    for _ in 0..2 {
        let response = pipeline
            .generate(request("¿Está disponible?").with_max_retries(0))
            .await
            .unwrap();
        assert_eq!(response.source, ResponseSource::Template);
    }
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn unresponsive_backend_falls_back_within_the_budget() {
    let mut config = PlazaConfig::default();
    config.backend.timeout_secs = 1;

    let backend = Arc::new(MockBackend::new().with_delay(Duration::from_secs(600)));
    let pipeline = orchestrator(&config, &backend);

    let response = pipeline
        .generate(request("¿Está disponible?"))
        .await
        .unwrap();

    assert_eq!(response.source, ResponseSource::Template);
    assert!(!response.text.is_empty());
    // The breaker opened after three timed-out attempts; the fourth never
    // reached the backend.
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn availability_question_gets_a_generated_reply() {
    let backend = Arc::new(MockBackend::with_responses(vec![
        "¡Sí! Sigue disponible, sin problema.".to_string(),
    ]));
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    let response = pipeline
        .generate(request("¿Está disponible todavía?"))
        .await
        .unwrap();

    assert_eq!(response.source, ResponseSource::Generated);
    assert!(response.verdict.is_safe);
    assert!(response.risk_score < 25);
    assert!(response.confidence > 0.0);
    assert_eq!(response.model, "mock-model");
    assert!(response.token_count > 0);
}

#[tokio::test]
async fn template_only_mode_never_calls_the_backend() {
    let mut config = PlazaConfig::default();
    config.pipeline.mode = OperationMode::TemplateOnly;

    let backend = Arc::new(MockBackend::with_responses(vec!["nunca".to_string()]));
    let pipeline = orchestrator(&config, &backend);

    let response = pipeline
        .generate(request("¿cuánto es lo último?"))
        .await
        .unwrap();

    assert_eq!(response.source, ResponseSource::Template);
    assert!(response.text.contains("400"), "got: {}", response.text);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn hybrid_mode_routes_greetings_to_templates() {
    let mut config = PlazaConfig::default();
    config.pipeline.mode = OperationMode::Hybrid;

    let backend = Arc::new(MockBackend::with_responses(vec![
        "Sigue a la venta.".to_string(),
    ]));
    let pipeline = orchestrator(&config, &backend);

    let greeting = pipeline.generate(request("hola")).await.unwrap();
    assert_eq!(greeting.source, ResponseSource::Template);
    assert_eq!(backend.calls(), 0);

    let question = pipeline
        .generate(request("¿Está disponible?"))
        .await
        .unwrap();
    assert_eq!(question.source, ResponseSource::Generated);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saturated_pipeline_rejects_without_deadline() {
    let mut config = PlazaConfig::default();
    config.pipeline.max_concurrent_requests = 1;

    let backend = Arc::new(MockBackend::new().with_delay(Duration::from_millis(200)));
    let pipeline = Arc::new(orchestrator(&config, &backend));

    let holder = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.generate(request("¿Está disponible?")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = pipeline
        .generate(request("¿sigue en venta?"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlazaError::Overloaded(_)), "got: {err}");

    assert!(holder.await.unwrap().is_ok());
}

#[tokio::test]
async fn degraded_health_routes_to_templates() {
    let backend = Arc::new(MockBackend::with_responses(vec!["nunca".to_string()]));
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    // Sustained slow failures drag the health score below the default
    // floor of 40.
    for _ in 0..10 {
        pipeline.monitor().record(PerformanceSample::new(
            20_000,
            false,
            ResponseSource::Template,
        ));
    }
    assert!(pipeline.monitor().health_score() < 40.0);

    let response = pipeline
        .generate(request("¿Está disponible?"))
        .await
        .unwrap();

    assert_eq!(response.source, ResponseSource::Template);
    assert_eq!(response.metadata.get("degraded").map(String::as_str), Some("true"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn skipped_outbound_validation_never_populates_the_cache() {
    let backend = Arc::new(MockBackend::with_responses(vec![
        "Hazme el pago por Western Union y listo.".to_string(),
        "Sí, sigue disponible.".to_string(),
    ]));
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    // A caller that opts out of outbound validation gets the raw text,
    // but that unscored text must never enter the shared cache.
    let mut lax = request("¿Está disponible?");
    lax.validation_required = false;
    let first = pipeline.generate(lax).await.unwrap();
    assert_eq!(first.source, ResponseSource::Generated);
    assert!(pipeline.client().cache().is_empty());

    // The next caller asking the same normalized question keeps full
    // validation: a fresh generation, gated as usual.
    let second = pipeline
        .generate(request("¿Está disponible?"))
        .await
        .unwrap();
    assert_eq!(backend.calls(), 2);
    assert!(
        !second.text.to_lowercase().contains("western union"),
        "unvalidated text served from cache: {}",
        second.text
    );
    assert!(second.verdict.is_safe);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_admission_deadline_yields_a_template_reply() {
    let mut config = PlazaConfig::default();
    config.pipeline.max_concurrent_requests = 1;

    let backend = Arc::new(MockBackend::new().with_delay(Duration::from_millis(200)));
    let pipeline = Arc::new(orchestrator(&config, &backend));

    let holder = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.generate(request("¿Está disponible?")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The permit stays held well past this deadline; the caller still
    // gets a usable reply instead of an error.
    let response = pipeline
        .generate_with_deadline(request("¿sigue en venta?"), Duration::from_millis(20))
        .await
        .unwrap();
    assert_eq!(response.source, ResponseSource::Template);
    assert!(!response.text.is_empty());

    assert!(holder.await.unwrap().is_ok());
    // Only the holder ever reached the backend.
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn unsafe_generated_text_is_discarded_for_a_template() {
    let backend = Arc::new(MockBackend::with_responses(vec![
        "Claro, hazme el pago por Western Union y te lo envío hoy.".to_string(),
    ]));
    let pipeline = orchestrator(&PlazaConfig::default(), &backend);

    let response = pipeline
        .generate(request("¿Está disponible?"))
        .await
        .unwrap();

    assert_eq!(response.source, ResponseSource::Template);
    assert!(
        !response.text.to_lowercase().contains("western union"),
        "unsafe generation leaked: {}",
        response.text
    );
    assert_eq!(backend.calls(), 1);

    // The discarded reply must not have been cached either.
    assert!(pipeline.client().cache().is_empty());
}
