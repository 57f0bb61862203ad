//! # Discord Webhook HTTP Service
//!
//! axum integration for Discord interaction webhooks.
//!
//! This crate provides:
//! - [`DiscordPlugin`], the validated per-application state
//! - [`interaction_hook`], the middleware that verifies requests and answers
//!   the handshake ping
//! - the [`Discord`] extractor that hands each route a request-scoped
//!   [`DiscordHelper`](discord_webhook_core::DiscordHelper)
//! - service wiring: router, health check, request logging, graceful shutdown

pub mod config;
pub mod errors;
pub mod extract;
pub mod hook;
pub mod plugin;

pub use config::{LoggingConfig, ServerConfig, ServiceConfig};
pub use errors::{ConfigError, HookRejection, ServiceError};
pub use extract::{dispatch_and_respond, respond, Discord, RecordResponse};
pub use hook::{
    interaction_hook, HookOutcome, VerifiedInteraction, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use plugin::{DiscordPlugin, DEFAULT_MAX_BODY_SIZE};

#[cfg(test)]
mod test_support;

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod middleware_tests;

use axum::{
    middleware,
    response::{Json, Response},
    routing::{get, MethodRouter},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

// ============================================================================
// Router
// ============================================================================

/// Build the service router.
///
/// `interactions` is mounted at the configured interactions path behind the
/// entry hook. `/health` is served without verification.
pub fn create_router(
    plugin: Arc<DiscordPlugin>,
    config: &ServiceConfig,
    interactions: MethodRouter,
) -> Router {
    let interaction_routes =
        plugin.install(Router::new().route(&config.server.interactions_path, interactions));

    let health_routes = Router::new().route("/health", get(handle_health_check));

    Router::new()
        .merge(interaction_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
}

/// Bind, serve until SIGINT or SIGTERM, then drain in-flight requests.
pub async fn start_server(
    config: ServiceConfig,
    plugin: Arc<DiscordPlugin>,
    interactions: MethodRouter,
) -> Result<(), ServiceError> {
    let app = create_router(plugin, &config, interactions);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(
        address = %address,
        path = %config.server.interactions_path,
        "Starting HTTP server"
    );

    let shutdown_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_seconds);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown_timeout: std::time::Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging with correlation ids.
///
/// Uses the caller's `x-correlation-id` or generates one and echoes it on the
/// response. On interaction routes the span also carries what the entry hook
/// decided and, for forwarded requests, the interaction id and type.
#[instrument(skip_all, fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id,
    hook_outcome,
    interaction_id,
    interaction_type
))]
async fn request_logging_middleware(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let span = tracing::Span::current();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    span.record("correlation_id", correlation_id.as_str());

    info!("Request started");

    let mut response = next.run(request).await;

    if let Some(outcome) = response.extensions().get::<HookOutcome>() {
        span.record("hook_outcome", outcome.label());
        match outcome {
            HookOutcome::Forwarded {
                interaction_id,
                interaction_type,
            } => {
                span.record("interaction_id", interaction_id.as_str());
                span.record("interaction_type", interaction_type.as_str());
            }
            HookOutcome::Rejected(rejection) => {
                warn!(reason = %rejection, "Interaction request rejected by entry hook");
            }
            HookOutcome::Handshake => {}
        }
    }

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    if status.is_server_error() {
        error!(status = %status, duration_ms, "Request completed with server error");
    } else if status.is_client_error() {
        warn!(status = %status, duration_ms, "Request completed with client error");
    } else {
        info!(status = %status, duration_ms, "Request completed");
    }

    response
}
