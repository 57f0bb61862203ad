//! Error types for interaction handling.
//!
//! [`DiscordError`] is the closed set of failures surfaced to callers of the
//! router and the plugin. Every variant carries a stable machine-readable code
//! (see [`DiscordError::code`]) so callers can match on failures without
//! parsing messages. Nothing in this crate retries a failure; all of them are
//! returned to the caller.

use thiserror::Error;

use crate::client::ApiError;
use crate::interaction::{Interaction, InteractionType};

/// Failures raised by the webhook plugin and the interaction router.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// Generic failure with an optional caller-supplied code.
    #[error("{message}")]
    Discord {
        message: String,
        code: Option<String>,
    },

    /// The request signature did not match the configured public key.
    #[error("{message}")]
    SignatureVerification { message: String },

    /// An operation on a specific interaction failed.
    ///
    /// Wraps the REST transport error when the platform call itself failed.
    #[error("{message}")]
    Interaction {
        message: String,
        interaction_id: String,
        interaction_type: InteractionType,
        #[source]
        source: Option<ApiError>,
    },

    /// A reply-family operation was invoked on an interaction that cannot be
    /// replied to. Raised before any network call is attempted.
    #[error("{message}")]
    NotRepliable {
        message: String,
        interaction_id: String,
        interaction_type: InteractionType,
    },

    /// The platform rejected the call because of rate limiting.
    #[error("{message}")]
    RateLimit { message: String, retry_after: f64 },

    /// Plugin configuration is missing or invalid.
    #[error("{message}")]
    Configuration { message: String, field: String },
}

impl DiscordError {
    pub const DEFAULT_CODE: &'static str = "DISCORD_ERROR";
    pub const SIGNATURE_VERIFICATION_CODE: &'static str = "SIGNATURE_VERIFICATION_FAILED";
    pub const INTERACTION_CODE: &'static str = "INTERACTION_ERROR";
    pub const NOT_REPLIABLE_CODE: &'static str = "INTERACTION_NOT_REPLIABLE";
    pub const RATE_LIMIT_CODE: &'static str = "RATE_LIMIT_EXCEEDED";
    pub const CONFIGURATION_CODE: &'static str = "CONFIGURATION_ERROR";

    /// Create a generic failure without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Discord {
            message: message.into(),
            code: None,
        }
    }

    /// Create a generic failure tagged with a caller-supplied code.
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Discord {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    pub fn signature_verification() -> Self {
        Self::SignatureVerification {
            message: "signature verification failed".to_string(),
        }
    }

    /// Failure attributed to `interaction` with no underlying transport error.
    pub fn interaction(interaction: &Interaction, message: impl Into<String>) -> Self {
        Self::Interaction {
            message: message.into(),
            interaction_id: interaction.id.clone(),
            interaction_type: interaction.kind,
            source: None,
        }
    }

    /// Wrap a REST failure that occurred while responding to `interaction`.
    pub fn interaction_failed(
        interaction: &Interaction,
        message: impl Into<String>,
        source: ApiError,
    ) -> Self {
        Self::Interaction {
            message: message.into(),
            interaction_id: interaction.id.clone(),
            interaction_type: interaction.kind,
            source: Some(source),
        }
    }

    pub fn not_repliable(interaction: &Interaction) -> Self {
        Self::NotRepliable {
            message: format!(
                "Interaction {} of type {} cannot be replied to",
                interaction.id, interaction.kind
            ),
            interaction_id: interaction.id.clone(),
            interaction_type: interaction.kind,
        }
    }

    pub fn rate_limit(retry_after: f64) -> Self {
        Self::RateLimit {
            message: "rate limit exceeded".to_string(),
            retry_after,
        }
    }

    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.into(),
        }
    }

    /// A required configuration field is absent or blank.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Configuration {
            message: format!("Missing required configuration: {}", field),
            field,
        }
    }

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &str {
        match self {
            Self::Discord { code, .. } => code.as_deref().unwrap_or(Self::DEFAULT_CODE),
            Self::SignatureVerification { .. } => Self::SIGNATURE_VERIFICATION_CODE,
            Self::Interaction { .. } => Self::INTERACTION_CODE,
            Self::NotRepliable { .. } => Self::NOT_REPLIABLE_CODE,
            Self::RateLimit { .. } => Self::RATE_LIMIT_CODE,
            Self::Configuration { .. } => Self::CONFIGURATION_CODE,
        }
    }

    /// True for interaction failures, including the not-repliable specialization.
    pub fn is_interaction_error(&self) -> bool {
        matches!(self, Self::Interaction { .. } | Self::NotRepliable { .. })
    }

    pub fn interaction_id(&self) -> Option<&str> {
        match self {
            Self::Interaction { interaction_id, .. } | Self::NotRepliable { interaction_id, .. } => {
                Some(interaction_id)
            }
            _ => None,
        }
    }

    pub fn interaction_type(&self) -> Option<InteractionType> {
        match self {
            Self::Interaction {
                interaction_type, ..
            }
            | Self::NotRepliable {
                interaction_type, ..
            } => Some(*interaction_type),
            _ => None,
        }
    }

    /// Offending field of a configuration failure.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Configuration { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Seconds the platform asked us to wait, if this failure stems from a
    /// rate limit (directly or through a wrapped REST error).
    pub fn retry_after(&self) -> Option<f64> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            Self::Interaction {
                source: Some(ApiError::RateLimited { retry_after, .. }),
                ..
            } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<ApiError> for DiscordError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::RateLimited { retry_after, .. } => Self::rate_limit(retry_after),
            other => Self::with_code(other.to_string(), "API_ERROR"),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
