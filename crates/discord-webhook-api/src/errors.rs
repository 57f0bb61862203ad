//! Error types for the HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use discord_webhook_core::DiscordError;
use tracing::warn;

/// Early exits of the interaction entry hook.
///
/// Each variant is a complete HTTP answer; none of them reach application
/// code. The body is always `{"error": "<message>"}`.
///
/// - `401 Unauthorized`: the request is not provably from Discord
/// - `400 Bad Request`: the request is authentic but unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HookRejection {
    /// Either signature header is absent or not valid header text.
    #[error("Missing signature headers")]
    MissingSignatureHeaders,

    /// The body could not be read, was too large, or is not UTF-8.
    #[error("Failed to read request body")]
    BodyUnreadable,

    #[error("Invalid signature")]
    InvalidSignature,

    /// The verified body is not JSON.
    #[error("Invalid JSON body")]
    InvalidJson,
}

impl HookRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSignatureHeaders | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::BodyUnreadable | Self::InvalidJson => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for HookRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), reason = %self, "Rejected interaction request");
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Plugin configuration rejected: {0}")]
    Plugin(#[from] DiscordError),
}
