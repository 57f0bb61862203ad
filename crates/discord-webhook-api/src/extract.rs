//! Request-scoped router derivation and response rendering.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use discord_webhook_core::{DiscordHelper, ResponseRecord};
use std::convert::Infallible;
use tracing::error;

use crate::hook::VerifiedInteraction;

/// Extracts a [`DiscordHelper`] bound to the request's verified interaction.
///
/// Holds `None` when the entry hook stored nothing: a non-POST request, or a
/// route the hook is not installed on. Never rejects.
///
/// ```rust,no_run
/// use axum::response::Response;
/// use discord_webhook_api::{dispatch_and_respond, Discord};
/// use discord_webhook_core::{EventCategory, HandlerError};
///
/// async fn interactions(Discord(helper): Discord) -> Response {
///     let Some(mut helper) = helper else {
///         return axum::http::StatusCode::NOT_FOUND.into_response();
///     };
///     helper.on_fn(EventCategory::Command, |helper, interaction| {
///         Box::pin(async move {
///             helper.reply(interaction, "Pong!").await?;
///             Ok::<(), HandlerError>(())
///         })
///     });
///     dispatch_and_respond(&helper).await
/// }
/// # use axum::response::IntoResponse;
/// ```
#[derive(Debug)]
pub struct Discord(pub Option<DiscordHelper>);

impl<S> FromRequestParts<S> for Discord
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Discord(
            parts
                .extensions
                .get::<VerifiedInteraction>()
                .map(VerifiedInteraction::helper),
        ))
    }
}

/// Wrapper giving [`ResponseRecord`] an HTTP rendering.
#[derive(Debug, Clone)]
pub struct RecordResponse(pub ResponseRecord);

impl From<ResponseRecord> for RecordResponse {
    fn from(record: ResponseRecord) -> Self {
        Self(record)
    }
}

/// 200 with the callback JSON.
impl IntoResponse for RecordResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.0.response)).into_response()
    }
}

/// Turn the helper's recorded response into the HTTP answer.
///
/// Returns 202 with `{}` when no response was recorded.
pub fn respond(helper: &DiscordHelper) -> Response {
    match helper.response() {
        Some(record) => RecordResponse(record).into_response(),
        None => (StatusCode::ACCEPTED, Json(serde_json::json!({}))).into_response(),
    }
}

/// Dispatch the helper and render its response.
///
/// A handler failure becomes 500 `{"error": "Interaction handler failed"}`;
/// the failure itself has already been logged by the router.
pub async fn dispatch_and_respond(helper: &DiscordHelper) -> Response {
    match helper.dispatch().await {
        Ok(()) => respond(helper),
        Err(e) => {
            error!(error = %e, "Interaction dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Interaction handler failed" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
