//! The per-request event router.
//!
//! A [`DiscordHelper`] is built for one verified interaction. Application code
//! registers handlers against event categories, calls [`DiscordHelper::dispatch`],
//! and returns [`DiscordHelper::response`] as the HTTP body. Handlers receive
//! the helper itself so they can reply, defer, edit or follow up.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::client::{ApiError, InteractionClient};
use crate::error::DiscordError;
use crate::handler::{handler_fn, HandlerError, HandlerRegistry, InteractionHandler};
use crate::interaction::{EventCategory, Interaction};
use crate::logger::ConsoleLogger;
use crate::response::{
    AutocompleteChoice, DeferOptions, InteractionResponse, MessagePayload, ModalPayload,
    ResponseKind, ResponseRecord,
};

/// Event router bound to at most one interaction.
///
/// Registration needs `&mut self`; dispatch and the response operations take
/// `&self` so handlers running concurrently can share the helper. The
/// recorded response sits behind a mutex that is never held across an await.
pub struct DiscordHelper {
    interaction: Option<Arc<Interaction>>,
    client: Arc<dyn InteractionClient>,
    application_id: String,
    logger: Arc<ConsoleLogger>,
    handlers: HandlerRegistry,
    last_response: Mutex<Option<ResponseRecord>>,
}

impl DiscordHelper {
    pub fn new(
        interaction: Option<Arc<Interaction>>,
        client: Arc<dyn InteractionClient>,
        application_id: impl Into<String>,
        logger: Arc<ConsoleLogger>,
    ) -> Self {
        Self {
            interaction,
            client,
            application_id: application_id.into(),
            logger,
            handlers: HandlerRegistry::new(),
            last_response: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The interaction this helper is bound to.
    pub fn interaction(&self) -> Option<&Interaction> {
        self.interaction.as_deref()
    }

    /// The underlying REST client, for calls the helper does not wrap.
    pub fn client(&self) -> &Arc<dyn InteractionClient> {
        &self.client
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn logger(&self) -> &ConsoleLogger {
        &self.logger
    }

    /// The last recorded response, if any operation produced one.
    pub fn response(&self) -> Option<ResponseRecord> {
        self.lock_response().clone()
    }

    pub fn handler_count(&self, category: EventCategory) -> usize {
        self.handlers.len(category)
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Append a handler to `category`. Chainable.
    pub fn on(
        &mut self,
        category: EventCategory,
        handler: impl InteractionHandler + 'static,
    ) -> &mut Self {
        self.on_shared(category, Arc::new(handler))
    }

    /// Append a handler that is shared with other helpers.
    pub fn on_shared(
        &mut self,
        category: EventCategory,
        handler: Arc<dyn InteractionHandler>,
    ) -> &mut Self {
        self.handlers.register(category, handler);
        self
    }

    /// Append an async closure as a handler. See [`handler_fn`].
    pub fn on_fn<F>(&mut self, category: EventCategory, func: F) -> &mut Self
    where
        F: for<'a> Fn(&'a DiscordHelper, &'a Interaction) -> BoxFuture<'a, Result<(), HandlerError>>
            + Send
            + Sync
            + 'static,
    {
        self.on(category, handler_fn(func))
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Run the wildcard handlers and the handlers of the held interaction's
    /// category concurrently.
    ///
    /// Without a held interaction this logs a warning and succeeds. Every
    /// handler runs to completion; the first failure in completion order is
    /// returned once all of them have settled.
    pub async fn dispatch(&self) -> Result<(), HandlerError> {
        let Some(interaction) = self.interaction.as_deref() else {
            warn!("dispatch called without a verified interaction");
            self.logger
                .warn("No interaction to dispatch; skipping handler execution");
            return Ok(());
        };

        let category = interaction.category();
        let handlers = self.handlers.collect(category);
        let handler_count = handlers.len();
        let category_name = category.map(|c| c.to_string());

        self.logger.info_with(
            "Dispatching interaction",
            &json!({
                "interaction_id": interaction.id,
                "interaction_type": interaction.kind.to_string(),
                "category": category_name,
                "handler_count": handler_count,
            }),
        );

        let start = Instant::now();
        let mut pending: FuturesUnordered<_> = handlers
            .iter()
            .map(|handler| handler.handle(self, interaction))
            .collect();
        let mut first_error: Option<HandlerError> = None;
        while let Some(outcome) = pending.next().await {
            if let Err(e) = outcome {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        let result = first_error.map_or(Ok(()), Err);
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => {
                info!(
                    interaction_id = %interaction.id,
                    category = ?category_name,
                    handler_count,
                    duration_ms,
                    "Interaction dispatched"
                );
                self.logger.success_with(
                    "Interaction handlers completed",
                    &json!({ "handler_count": handler_count, "duration_ms": duration_ms }),
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    interaction_id = %interaction.id,
                    handler_count,
                    duration_ms,
                    error = %e,
                    "Interaction handler failed"
                );
                self.logger.error_report(
                    &format!(
                        "Interaction handler failed after {}ms ({} handlers)",
                        duration_ms, handler_count
                    ),
                    &*e,
                );
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Reply family
    // ------------------------------------------------------------------------

    /// Respond with a channel message (callback type 4).
    pub async fn reply(
        &self,
        interaction: &Interaction,
        message: impl Into<MessagePayload>,
    ) -> Result<(), DiscordError> {
        self.ensure_repliable(interaction, "reply")?;
        let response = InteractionResponse::message(message.into());
        self.send_callback(interaction, "reply", ResponseKind::Reply, response)
            .await
    }

    /// Acknowledge now and send the message later with [`Self::edit_reply`]
    /// (callback type 5).
    pub async fn defer_reply(
        &self,
        interaction: &Interaction,
        options: DeferOptions,
    ) -> Result<(), DiscordError> {
        self.ensure_repliable(interaction, "defer_reply")?;
        let response = InteractionResponse::deferred(options);
        self.send_callback(
            interaction,
            "defer_reply",
            ResponseKind::DeferredReply,
            response,
        )
        .await
    }

    /// Replace the content of the original response.
    ///
    /// The edited message becomes the recorded response.
    pub async fn edit_reply(
        &self,
        interaction: &Interaction,
        message: impl Into<MessagePayload>,
    ) -> Result<Value, DiscordError> {
        const OPERATION: &str = "edit_reply";
        self.ensure_repliable(interaction, OPERATION)?;
        let message = message.into();
        self.log_start(interaction, OPERATION, &json!({ "message": &message }));

        let start = Instant::now();
        let result = self
            .client
            .edit_original_response(&self.application_id, &interaction.token, &message)
            .await;
        let sent = self.finish(interaction, OPERATION, start, result)?;

        self.record(ResponseRecord::new(
            ResponseKind::Edit,
            InteractionResponse::message(message),
        ));
        Ok(sent)
    }

    /// Send an additional message. The recorded response is left untouched.
    pub async fn follow_up(
        &self,
        interaction: &Interaction,
        message: impl Into<MessagePayload>,
    ) -> Result<Value, DiscordError> {
        const OPERATION: &str = "follow_up";
        self.ensure_repliable(interaction, OPERATION)?;
        let message = message.into();
        self.log_start(interaction, OPERATION, &json!({ "message": &message }));

        let start = Instant::now();
        let result = self
            .client
            .create_followup(&self.application_id, &interaction.token, &message)
            .await;
        self.finish(interaction, OPERATION, start, result)
    }

    /// Delete the original response.
    pub async fn delete_reply(&self, interaction: &Interaction) -> Result<(), DiscordError> {
        const OPERATION: &str = "delete_reply";
        self.ensure_repliable(interaction, OPERATION)?;
        self.log_start(interaction, OPERATION, &Value::Null);

        let start = Instant::now();
        let result = self
            .client
            .delete_original_response(&self.application_id, &interaction.token)
            .await;
        self.finish(interaction, OPERATION, start, result)
    }

    /// Acknowledge a component interaction without changing its message yet
    /// (callback type 6).
    pub async fn defer_update(&self, interaction: &Interaction) -> Result<(), DiscordError> {
        self.ensure_component(interaction, "defer_update")?;
        self.send_callback(
            interaction,
            "defer_update",
            ResponseKind::DeferredUpdate,
            InteractionResponse::deferred_update(),
        )
        .await
    }

    /// Edit the message a component is attached to (callback type 7).
    pub async fn update_message(
        &self,
        interaction: &Interaction,
        message: impl Into<MessagePayload>,
    ) -> Result<(), DiscordError> {
        self.ensure_component(interaction, "update_message")?;
        self.send_callback(
            interaction,
            "update_message",
            ResponseKind::UpdateMessage,
            InteractionResponse::update(message.into()),
        )
        .await
    }

    /// Open a modal dialog (callback type 9).
    ///
    /// Only commands and message components can open a modal.
    pub async fn show_modal(
        &self,
        interaction: &Interaction,
        modal: ModalPayload,
    ) -> Result<(), DiscordError> {
        const OPERATION: &str = "show_modal";
        if !(interaction.is_command() || interaction.is_message_component()) {
            return Err(self.precondition_failed(
                interaction,
                OPERATION,
                "a modal can only be shown for commands and message components",
            ));
        }
        self.send_callback(
            interaction,
            OPERATION,
            ResponseKind::Modal,
            InteractionResponse::modal(modal),
        )
        .await
    }

    /// Answer an autocomplete request with up to 25 choices (callback type 8).
    pub async fn respond_autocomplete(
        &self,
        interaction: &Interaction,
        choices: Vec<AutocompleteChoice>,
    ) -> Result<(), DiscordError> {
        const OPERATION: &str = "respond_autocomplete";
        if !interaction.is_autocomplete() {
            return Err(self.precondition_failed(
                interaction,
                OPERATION,
                "only autocomplete interactions accept choices",
            ));
        }
        self.send_callback(
            interaction,
            OPERATION,
            ResponseKind::Autocomplete,
            InteractionResponse::autocomplete(choices),
        )
        .await
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn ensure_repliable(
        &self,
        interaction: &Interaction,
        operation: &str,
    ) -> Result<(), DiscordError> {
        if interaction.is_repliable() {
            return Ok(());
        }
        let err = DiscordError::not_repliable(interaction);
        warn!(
            interaction_id = %interaction.id,
            interaction_type = %interaction.kind,
            operation,
            "Interaction cannot be replied to"
        );
        self.logger.error(&format!("{} rejected: {}", operation, err));
        Err(err)
    }

    fn ensure_component(
        &self,
        interaction: &Interaction,
        operation: &str,
    ) -> Result<(), DiscordError> {
        if interaction.is_message_component() {
            return Ok(());
        }
        Err(self.precondition_failed(
            interaction,
            operation,
            "only message component interactions can update their message",
        ))
    }

    fn precondition_failed(
        &self,
        interaction: &Interaction,
        operation: &str,
        reason: &str,
    ) -> DiscordError {
        warn!(
            interaction_id = %interaction.id,
            interaction_type = %interaction.kind,
            operation,
            reason,
            "Response operation not allowed for interaction"
        );
        self.logger
            .error(&format!("{} rejected: {}", operation, reason));
        DiscordError::interaction(interaction, format!("{}: {}", operation, reason))
    }

    /// POST an interaction callback and record it on success.
    async fn send_callback(
        &self,
        interaction: &Interaction,
        operation: &str,
        kind: ResponseKind,
        response: InteractionResponse,
    ) -> Result<(), DiscordError> {
        self.log_start(interaction, operation, &json!({ "response": &response }));

        let start = Instant::now();
        let result = self
            .client
            .create_response(&interaction.id, &interaction.token, &response)
            .await;
        self.finish(interaction, operation, start, result)?;

        self.record(ResponseRecord::new(kind, response));
        Ok(())
    }

    fn log_start(&self, interaction: &Interaction, operation: &str, parameters: &Value) {
        self.logger.info_with(
            &format!("{} started", operation),
            &json!({
                "interaction_id": interaction.id,
                "interaction_type": interaction.kind.to_string(),
                "parameters": parameters,
            }),
        );
    }

    /// Log the outcome of a REST call and wrap a failure into an interaction error.
    fn finish<T>(
        &self,
        interaction: &Interaction,
        operation: &str,
        start: Instant,
        result: Result<T, ApiError>,
    ) -> Result<T, DiscordError> {
        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                info!(
                    interaction_id = %interaction.id,
                    operation,
                    duration_ms,
                    "Interaction response sent"
                );
                self.logger
                    .success(&format!("{} completed in {}ms", operation, duration_ms));
                Ok(value)
            }
            Err(e) => {
                error!(
                    interaction_id = %interaction.id,
                    operation,
                    duration_ms,
                    error = %e,
                    "Interaction response failed"
                );
                let err = DiscordError::interaction_failed(
                    interaction,
                    format!("Failed to {} to interaction {}", operation, interaction.id),
                    e,
                );
                self.logger
                    .error_report(&format!("{} failed after {}ms", operation, duration_ms), &err);
                Err(err)
            }
        }
    }

    fn record(&self, record: ResponseRecord) {
        *self.lock_response() = Some(record);
    }

    fn lock_response(&self) -> std::sync::MutexGuard<'_, Option<ResponseRecord>> {
        self.last_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DiscordHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordHelper")
            .field("interaction", &self.interaction)
            .field("application_id", &self.application_id)
            .field("handlers", &self.handlers)
            .field("last_response", &self.response())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "helper_tests.rs"]
mod tests;
