//! # Discord Webhook Core
//!
//! Framework-independent building blocks for handling Discord interaction
//! webhooks:
//!
//! - typed interaction payloads and their routing categories
//! - Ed25519 request signature verification
//! - a REST client for interaction callbacks, edits and follow-ups
//! - the per-request event router, [`DiscordHelper`]
//! - a verbose developer console, [`ConsoleLogger`]
//!
//! The HTTP entry hook lives in `discord-webhook-api`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use discord_webhook_core::{
//!     ClientConfig, ConsoleLogger, DiscordHelper, EventCategory, HandlerError, Interaction,
//!     ReqwestInteractionClient,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(interaction: Interaction) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = Arc::new(ReqwestInteractionClient::new("bot-token", ClientConfig::default())?);
//! let mut helper = DiscordHelper::new(
//!     Some(Arc::new(interaction)),
//!     client,
//!     "123456789",
//!     Arc::new(ConsoleLogger::new(true)),
//! );
//!
//! helper.on_fn(EventCategory::Command, |helper, interaction| {
//!     Box::pin(async move {
//!         if interaction.command_name() == Some("ping") {
//!             helper.reply(interaction, "Pong!").await?;
//!         }
//!         Ok::<(), HandlerError>(())
//!     })
//! });
//!
//! helper.dispatch().await?;
//! let body = helper.response();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod helper;
pub mod interaction;
pub mod logger;
pub mod response;
pub mod verification;

pub use client::{ApiError, ClientConfig, InteractionClient, ReqwestInteractionClient};
pub use config::PluginConfig;
pub use error::DiscordError;
pub use handler::{handler_fn, FnHandler, HandlerError, HandlerRegistry, InteractionHandler};
pub use helper::DiscordHelper;
pub use interaction::{
    CommandOption, ComponentType, EventCategory, Interaction, InteractionData, InteractionType,
    Member, User,
};
pub use logger::ConsoleLogger;
pub use response::{
    AutocompleteChoice, CallbackType, DeferOptions, InteractionResponse, MessagePayload,
    ModalPayload, ResponseKind, ResponseRecord, EPHEMERAL_FLAG,
};
pub use verification::{Ed25519Verifier, SignatureVerifier};
