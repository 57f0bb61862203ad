//! Example bot: slash commands, components, a modal and an audit trail.
//!
//! Handlers are built once and shared by every request's helper through
//! [`DiscordHelper::on_shared`].

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, MethodRouter},
};
use discord_webhook_api::{dispatch_and_respond, Discord};
use discord_webhook_core::{
    ApiError, AutocompleteChoice, DeferOptions, DiscordHelper, EventCategory, HandlerError,
    Interaction, InteractionClient, InteractionHandler, MessagePayload, ModalPayload,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const SLOW_BUTTON_ID: &str = "slow_button";
pub const COLOR_SELECT_ID: &str = "color_select";
pub const FEEDBACK_MODAL_ID: &str = "feedback_modal";
pub const FEEDBACK_INPUT_ID: &str = "feedback_text";

/// Autocomplete accepts at most this many choices.
const MAX_CHOICES: usize = 25;

const ECHO_SUGGESTIONS: &[&str] = &[
    "hello",
    "hello world",
    "good morning",
    "good night",
    "ping",
    "pong",
];

// ============================================================================
// Bot
// ============================================================================

/// The handler set of the example bot.
pub struct ExampleBot {
    audit: Arc<AuditHandler>,
    commands: Arc<dyn InteractionHandler>,
    autocomplete: Arc<dyn InteractionHandler>,
    buttons: Arc<dyn InteractionHandler>,
    selects: Arc<dyn InteractionHandler>,
    modals: Arc<dyn InteractionHandler>,
}

impl ExampleBot {
    pub fn new() -> Self {
        Self::with_work_delay(Duration::from_secs(1))
    }

    /// `work_delay` is how long the slow button pretends to work between
    /// deferring and editing.
    pub fn with_work_delay(work_delay: Duration) -> Self {
        Self {
            audit: Arc::new(AuditHandler::default()),
            commands: Arc::new(CommandHandler),
            autocomplete: Arc::new(EchoAutocomplete),
            buttons: Arc::new(SlowButton { work_delay }),
            selects: Arc::new(ColorSelect),
            modals: Arc::new(FeedbackModal),
        }
    }

    /// Register every handler on a request's helper.
    pub fn install(&self, helper: &mut DiscordHelper) {
        helper
            .on_shared(EventCategory::Any, self.audit.clone())
            .on_shared(EventCategory::Command, self.commands.clone())
            .on_shared(EventCategory::Autocomplete, self.autocomplete.clone())
            .on_shared(EventCategory::Button, self.buttons.clone())
            .on_shared(EventCategory::Select, self.selects.clone())
            .on_shared(EventCategory::Modal, self.modals.clone());
    }

    /// Number of interactions the audit handler has seen.
    pub fn audited(&self) -> u64 {
        self.audit.seen.load(Ordering::Relaxed)
    }
}

impl Default for ExampleBot {
    fn default() -> Self {
        Self::new()
    }
}

/// The `POST` handler for the interactions route.
pub fn interactions_route(bot: Arc<ExampleBot>) -> MethodRouter {
    post(move |Discord(helper): Discord| {
        let bot = bot.clone();
        async move { handle(&bot, helper).await }
    })
}

async fn handle(bot: &ExampleBot, helper: Option<DiscordHelper>) -> Response {
    match helper {
        Some(mut helper) => {
            bot.install(&mut helper);
            dispatch_and_respond(&helper).await
        }
        None => {
            warn!("Interactions route reached without a verified interaction");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Slash command definitions registered by `--register-commands`.
pub fn command_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "ping",
            "description": "Check that the bot is alive",
            "type": 1
        }),
        json!({
            "name": "echo",
            "description": "Repeat a message back, with some buttons to play with",
            "type": 1,
            "options": [{
                "name": "text",
                "description": "What to echo",
                "type": 3,
                "required": true,
                "autocomplete": true
            }]
        }),
        json!({
            "name": "feedback",
            "description": "Tell us what you think",
            "type": 1
        }),
    ]
}

/// Register [`command_definitions`] globally or in one guild.
///
/// Returns the number of commands the platform reports back.
pub async fn register_commands(
    client: &dyn InteractionClient,
    application_id: &str,
    guild_id: Option<&str>,
) -> Result<usize, ApiError> {
    let commands = command_definitions();
    let registered = match guild_id {
        Some(guild_id) => {
            client
                .register_guild_commands(application_id, guild_id, &commands)
                .await?
        }
        None => {
            client
                .register_global_commands(application_id, &commands)
                .await?
        }
    };

    let count = registered.as_array().map(Vec::len).unwrap_or(0);
    info!(
        application_id = %application_id,
        guild_id = guild_id.unwrap_or("global"),
        count,
        "Registered slash commands"
    );
    Ok(count)
}

fn echo_components() -> Vec<Value> {
    vec![
        json!({
            "type": 1,
            "components": [{
                "type": 2,
                "style": 1,
                "label": "Do something slow",
                "custom_id": SLOW_BUTTON_ID
            }]
        }),
        json!({
            "type": 1,
            "components": [{
                "type": 3,
                "custom_id": COLOR_SELECT_ID,
                "placeholder": "Pick a color",
                "options": [
                    { "label": "Red", "value": "red" },
                    { "label": "Green", "value": "green" },
                    { "label": "Blue", "value": "blue" }
                ]
            }]
        }),
    ]
}

fn feedback_modal() -> ModalPayload {
    ModalPayload {
        custom_id: FEEDBACK_MODAL_ID.to_string(),
        title: "Feedback".to_string(),
        components: vec![json!({
            "type": 1,
            "components": [{
                "type": 4,
                "custom_id": FEEDBACK_INPUT_ID,
                "label": "Your feedback",
                "style": 2,
                "required": true
            }]
        })],
    }
}

struct CommandHandler;

#[async_trait]
impl InteractionHandler for CommandHandler {
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        match interaction.command_name() {
            Some("ping") => helper.reply(interaction, "Pong!").await?,
            Some("echo") => {
                let text = interaction.option_str("text").unwrap_or("(nothing)");
                let mut message = MessagePayload::content(text);
                message.components = echo_components();
                helper.reply(interaction, message).await?;
            }
            Some("feedback") => helper.show_modal(interaction, feedback_modal()).await?,
            other => {
                warn!(command = ?other, "Unknown command");
                helper
                    .reply(
                        interaction,
                        MessagePayload::content("Unknown command").ephemeral(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Autocomplete
// ============================================================================

struct EchoAutocomplete;

/// Suggestions starting with what the user typed so far.
fn suggestions(typed: &str) -> Vec<AutocompleteChoice> {
    let typed = typed.to_lowercase();
    ECHO_SUGGESTIONS
        .iter()
        .filter(|s| s.starts_with(&typed))
        .take(MAX_CHOICES)
        .map(|s| AutocompleteChoice::new(*s, *s))
        .collect()
}

#[async_trait]
impl InteractionHandler for EchoAutocomplete {
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        let typed = interaction
            .focused_option()
            .and_then(|o| o.value.as_ref())
            .and_then(Value::as_str)
            .unwrap_or_default();
        helper
            .respond_autocomplete(interaction, suggestions(typed))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Components
// ============================================================================

struct SlowButton {
    work_delay: Duration,
}

#[async_trait]
impl InteractionHandler for SlowButton {
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        if interaction.custom_id() != Some(SLOW_BUTTON_ID) {
            return Ok(());
        }

        helper
            .defer_reply(interaction, DeferOptions::ephemeral())
            .await?;
        tokio::time::sleep(self.work_delay).await;
        helper
            .edit_reply(interaction, "Finished the slow task.")
            .await?;
        Ok(())
    }
}

struct ColorSelect;

#[async_trait]
impl InteractionHandler for ColorSelect {
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        if interaction.custom_id() != Some(COLOR_SELECT_ID) {
            return Ok(());
        }

        let picked = interaction.values().join(", ");
        helper
            .update_message(interaction, format!("You picked: {}", picked))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Modals
// ============================================================================

struct FeedbackModal;

#[async_trait]
impl InteractionHandler for FeedbackModal {
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        if interaction.custom_id() != Some(FEEDBACK_MODAL_ID) {
            return Ok(());
        }

        let feedback = interaction
            .modal_value(FEEDBACK_INPUT_ID)
            .unwrap_or_default();
        helper
            .reply(
                interaction,
                MessagePayload::content(format!("Thanks for the feedback: {}", feedback))
                    .ephemeral(),
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// Audit
// ============================================================================

/// Logs every interaction regardless of category.
#[derive(Default)]
struct AuditHandler {
    seen: AtomicU64,
}

#[async_trait]
impl InteractionHandler for AuditHandler {
    async fn handle(
        &self,
        _helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        info!(
            interaction_id = %interaction.id,
            category = ?interaction.category(),
            user = interaction.invoking_user().map(|u| u.username.as_str()).unwrap_or("unknown"),
            guild_id = interaction.guild_id.as_deref().unwrap_or("dm"),
            "Interaction received"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "bot_tests.rs"]
mod tests;
