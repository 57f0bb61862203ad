//! Tests for the service router and its middleware.

use super::*;
use crate::test_support::{plugin_with, sign, RecordingClient, StaticVerifier, TIMESTAMP};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::post,
};
use tower::ServiceExt; // For `oneshot`

fn app(accept: bool) -> Router {
    let plugin = plugin_with(
        Arc::new(StaticVerifier::new(accept)),
        Arc::new(RecordingClient::default()),
    );
    create_router(
        plugin,
        &ServiceConfig::default(),
        post(|Discord(helper): Discord| async move {
            match helper {
                Some(helper) => dispatch_and_respond(&helper).await,
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }),
    )
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_served_without_signature() {
    let response = app(false)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// ============================================================================
// Correlation ids
// ============================================================================

#[tokio::test]
async fn test_request_logging_echoes_correlation_id() {
    let request = Request::builder()
        .uri("/health")
        .header("x-correlation-id", "test-correlation-123")
        .body(Body::empty())
        .unwrap();

    let response = app(true).oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        "test-correlation-123"
    );
}

#[tokio::test]
async fn test_request_logging_generates_correlation_id_if_missing() {
    let response = app(true)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let id = response
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_rejections_still_carry_correlation_id() {
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .body(Body::from(r#"{"type":1}"#))
        .unwrap();

    let response = app(true).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-correlation-id"));
    assert_eq!(
        response.extensions().get::<HookOutcome>(),
        Some(&HookOutcome::Rejected(HookRejection::MissingSignatureHeaders))
    );
}

// ============================================================================
// Interactions route
// ============================================================================

#[tokio::test]
async fn test_interactions_route_answers_ping() {
    let body = r#"{"type":1}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .header(SIGNATURE_HEADER, sign(TIMESTAMP, body))
        .header(TIMESTAMP_HEADER, TIMESTAMP)
        .body(Body::from(body))
        .unwrap();

    let response = app(true).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), br#"{"type":1}"#);
}

#[tokio::test]
async fn test_interaction_without_handlers_is_accepted() {
    let body = r#"{"id":"1","type":2,"token":"t","data":{"name":"ping"}}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .header(SIGNATURE_HEADER, sign(TIMESTAMP, body))
        .header(TIMESTAMP_HEADER, TIMESTAMP)
        .body(Body::from(body))
        .unwrap();

    let response = app(true).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().contains_key("x-correlation-id"));
    assert_eq!(
        response.extensions().get::<HookOutcome>().map(HookOutcome::label),
        Some("forwarded")
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app(true)
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
