//! REST client for the interaction endpoints of the Discord API.
//!
//! Interaction callbacks and the webhook-token endpoints (`@original`,
//! follow-ups) are authenticated by the interaction token in the URL. Command
//! registration uses the bot token.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::response::{InteractionResponse, MessagePayload};

/// Base URL of the versioned Discord REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Errors returned by the REST transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success response not covered by a more specific variant.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// The platform rejected the call with 429.
    #[error("Rate limited, retry after {retry_after}s (global: {global})")]
    RateLimited { retry_after: f64, global: bool },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Resource not found")]
    NotFound,

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Network, TLS or timeout failure.
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the call may succeed if repeated later. Nothing in this crate
    /// retries; the classification is for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500,
            Self::RateLimited { .. } => true,
            Self::Unauthorized => false,
            Self::NotFound => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Unauthorized => Some(401),
            Self::NotFound => Some(404),
            _ => None,
        }
    }
}

/// Outbound operations against the interaction REST API.
#[async_trait]
pub trait InteractionClient: Send + Sync {
    /// POST `/interactions/{id}/{token}/callback`.
    async fn create_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError>;

    /// PATCH `/webhooks/{application_id}/{token}/messages/@original`.
    async fn edit_original_response(
        &self,
        application_id: &str,
        token: &str,
        message: &MessagePayload,
    ) -> Result<Value, ApiError>;

    /// DELETE `/webhooks/{application_id}/{token}/messages/@original`.
    async fn delete_original_response(
        &self,
        application_id: &str,
        token: &str,
    ) -> Result<(), ApiError>;

    /// POST `/webhooks/{application_id}/{token}`.
    async fn create_followup(
        &self,
        application_id: &str,
        token: &str,
        message: &MessagePayload,
    ) -> Result<Value, ApiError>;

    /// PUT `/applications/{application_id}/commands`, replacing every global
    /// command.
    async fn register_global_commands(
        &self,
        application_id: &str,
        commands: &[Value],
    ) -> Result<Value, ApiError>;

    /// PUT `/applications/{application_id}/guilds/{guild_id}/commands`.
    async fn register_guild_commands(
        &self,
        application_id: &str,
        guild_id: &str,
        commands: &[Value],
    ) -> Result<Value, ApiError>;
}

/// Settings for [`ReqwestInteractionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: format!(
                "DiscordBot (https://github.com/pvandervelde/discord-webhook, {})",
                env!("CARGO_PKG_VERSION")
            ),
            timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`InteractionClient`] backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestInteractionClient {
    http: reqwest::Client,
    bot_token: String,
    config: ClientConfig,
}

impl ReqwestInteractionClient {
    pub fn new(bot_token: impl Into<String>, config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            bot_token: bot_token.into(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    fn bot_authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }
}

impl std::fmt::Debug for ReqwestInteractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestInteractionClient")
            .field("config", &self.config)
            .field("bot_token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl InteractionClient for ReqwestInteractionClient {
    #[instrument(skip(self, token, response), fields(callback_type = u8::from(response.kind)))]
    async fn create_response(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("/interactions/{}/{}/callback", interaction_id, token));
        let response = self.http.post(url).json(response).send().await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self, token, message))]
    async fn edit_original_response(
        &self,
        application_id: &str,
        token: &str,
        message: &MessagePayload,
    ) -> Result<Value, ApiError> {
        let url = self.url(&format!(
            "/webhooks/{}/{}/messages/@original",
            application_id, token
        ));
        let response = self.http.patch(url).json(message).send().await?;
        read_json(check_status(response).await?).await
    }

    #[instrument(skip(self, token))]
    async fn delete_original_response(
        &self,
        application_id: &str,
        token: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!(
            "/webhooks/{}/{}/messages/@original",
            application_id, token
        ));
        let response = self.http.delete(url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    #[instrument(skip(self, token, message))]
    async fn create_followup(
        &self,
        application_id: &str,
        token: &str,
        message: &MessagePayload,
    ) -> Result<Value, ApiError> {
        let url = self.url(&format!("/webhooks/{}/{}", application_id, token));
        let response = self.http.post(url).json(message).send().await?;
        read_json(check_status(response).await?).await
    }

    #[instrument(skip(self, commands), fields(command_count = commands.len()))]
    async fn register_global_commands(
        &self,
        application_id: &str,
        commands: &[Value],
    ) -> Result<Value, ApiError> {
        let url = self.url(&format!("/applications/{}/commands", application_id));
        let response = self
            .http
            .put(url)
            .header(reqwest::header::AUTHORIZATION, self.bot_authorization())
            .json(commands)
            .send()
            .await?;
        read_json(check_status(response).await?).await
    }

    #[instrument(skip(self, commands), fields(command_count = commands.len()))]
    async fn register_guild_commands(
        &self,
        application_id: &str,
        guild_id: &str,
        commands: &[Value],
    ) -> Result<Value, ApiError> {
        let url = self.url(&format!(
            "/applications/{}/guilds/{}/commands",
            application_id, guild_id
        ));
        let response = self
            .http
            .put(url)
            .header(reqwest::header::AUTHORIZATION, self.bot_authorization())
            .json(commands)
            .send()
            .await?;
        read_json(check_status(response).await?).await
    }
}

/// Map a non-success response onto [`ApiError`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    debug!(status = status.as_u16(), "Discord API returned an error status");

    Err(match status.as_u16() {
        401 => ApiError::Unauthorized,
        404 => ApiError::NotFound,
        429 => {
            let header_retry = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<f64>().ok());
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let retry_after = body
                .get("retry_after")
                .and_then(Value::as_f64)
                .or(header_retry)
                .unwrap_or(0.0);
            let global = body
                .get("global")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            ApiError::RateLimited {
                retry_after,
                global,
            }
        }
        _ => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            ApiError::HttpError {
                status: status.as_u16(),
                message,
            }
        }
    })
}

/// Decode a JSON body; an empty body (204) decodes to `Value::Null`.
async fn read_json(response: reqwest::Response) -> Result<Value, ApiError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
