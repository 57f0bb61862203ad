//! Entry hook for interaction webhooks.
//!
//! [`interaction_hook`] is an axum middleware installed with
//! [`DiscordPlugin::install`](crate::DiscordPlugin::install). For every POST it
//! checks the signature headers, reads and verifies the body, answers the
//! handshake ping itself, and otherwise stores a [`VerifiedInteraction`] in the
//! request extensions before forwarding the request with its body restored.
//! The decision is left on the response as a [`HookOutcome`]. Requests with any
//! other method pass through untouched.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use discord_webhook_core::{Interaction, InteractionResponse};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::errors::HookRejection;
use crate::plugin::DiscordPlugin;

/// Header carrying the hex-encoded Ed25519 signature.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";

/// Header carrying the timestamp that prefixes the signed message.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Interaction discriminant of the handshake ping.
const PING_TYPE: u64 = 1;

/// A verified, parsed interaction stored in the request extensions.
#[derive(Clone)]
pub struct VerifiedInteraction {
    pub interaction: Arc<Interaction>,
    pub plugin: Arc<DiscordPlugin>,
}

impl VerifiedInteraction {
    pub fn helper(&self) -> discord_webhook_core::DiscordHelper {
        self.plugin.helper(Some(self.interaction.clone()))
    }
}

impl std::fmt::Debug for VerifiedInteraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifiedInteraction")
            .field("interaction", &self.interaction)
            .finish_non_exhaustive()
    }
}

/// What the hook decided for a request.
///
/// Attached to the extensions of every POST response that passed through the
/// hook so outer layers can log the interaction context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Handshake ping answered by the hook.
    Handshake,
    /// Verified interaction handed to the route.
    Forwarded {
        interaction_id: String,
        interaction_type: String,
    },
    /// Request refused before routing.
    Rejected(HookRejection),
}

impl HookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::Forwarded { .. } => "forwarded",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Outcome of a successful verification.
enum Verified {
    /// Handshake ping; answered here.
    Ping,
    /// Anything else; forwarded downstream.
    Forward(Request, HookOutcome),
}

/// Verify inbound interaction requests before they reach a route.
pub async fn interaction_hook(
    State(plugin): State<Arc<DiscordPlugin>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let (mut response, outcome) = match verify_request(&plugin, request).await {
        Ok(Verified::Ping) => {
            info!("Answered handshake ping");
            plugin.logger().info("Received PING, responding with PONG");
            (
                Json(InteractionResponse::pong()).into_response(),
                HookOutcome::Handshake,
            )
        }
        Ok(Verified::Forward(request, outcome)) => (next.run(request).await, outcome),
        Err(rejection) => {
            plugin
                .logger()
                .warn(&format!("Rejected interaction request: {}", rejection));
            (rejection.into_response(), HookOutcome::Rejected(rejection))
        }
    };

    response.extensions_mut().insert(outcome);
    response
}

#[instrument(skip_all, fields(uri = %request.uri()))]
async fn verify_request(
    plugin: &Arc<DiscordPlugin>,
    request: Request,
) -> Result<Verified, HookRejection> {
    let start = Instant::now();
    let (mut parts, body) = request.into_parts();

    let (Some(signature), Some(timestamp)) = (
        header_text(&parts.headers, SIGNATURE_HEADER),
        header_text(&parts.headers, TIMESTAMP_HEADER),
    ) else {
        return Err(HookRejection::MissingSignatureHeaders);
    };

    let bytes = to_bytes(body, plugin.max_body_size())
        .await
        .map_err(|e| {
            debug!(error = %e, "Failed to read interaction body");
            HookRejection::BodyUnreadable
        })?;
    let text = std::str::from_utf8(&bytes).map_err(|_| HookRejection::BodyUnreadable)?;

    if !plugin
        .verifier()
        .verify(text.as_bytes(), &signature, &timestamp)
        .await
    {
        return Err(HookRejection::InvalidSignature);
    }

    let value: Value = serde_json::from_str(text).map_err(|_| HookRejection::InvalidJson)?;

    // Only the discriminant matters for the handshake; other fields may be
    // malformed.
    if value.get("type").and_then(Value::as_u64) == Some(PING_TYPE) {
        return Ok(Verified::Ping);
    }

    let interaction = Interaction::from_value(value).map_err(|e| {
        debug!(error = %e, "Verified body is not an interaction");
        HookRejection::InvalidJson
    })?;

    plugin.logger().info_with(
        "Verified interaction",
        &serde_json::json!({
            "interaction_id": interaction.id,
            "interaction_type": interaction.kind.to_string(),
            "category": interaction.category().map(|c| c.to_string()),
            "verification_ms": start.elapsed().as_millis() as u64,
        }),
    );
    debug!(
        interaction_id = %interaction.id,
        interaction_type = %interaction.kind,
        "Interaction verified"
    );

    let outcome = HookOutcome::Forwarded {
        interaction_id: interaction.id.clone(),
        interaction_type: interaction.kind.to_string(),
    };
    parts.extensions.insert(VerifiedInteraction {
        interaction: Arc::new(interaction),
        plugin: plugin.clone(),
    });

    Ok(Verified::Forward(
        Request::from_parts(parts, Body::from(bytes)),
        outcome,
    ))
}

/// Header value as text; absent, empty or non-visible-ASCII values count as missing.
fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[path = "hook_tests.rs"]
mod tests;
