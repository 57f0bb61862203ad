//! Interaction handler trait and the per-request handler registry.
//!
//! Handlers are registered against an [`EventCategory`]. When an interaction
//! is dispatched, the wildcard handlers and the handlers of the interaction's
//! category run concurrently.
//!
//! # Examples
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use discord_webhook_core::{DiscordHelper, HandlerError, Interaction, InteractionHandler};
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl InteractionHandler for PingHandler {
//!     async fn handle(&self, helper: &DiscordHelper, interaction: &Interaction) -> Result<(), HandlerError> {
//!         if interaction.command_name() == Some("ping") {
//!             helper.reply(interaction, "Pong!").await?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use crate::helper::DiscordHelper;
use crate::interaction::{EventCategory, Interaction};

/// Error type returned by handlers. Any error can be propagated with `?`.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Application-provided processing for one kind of interaction.
///
/// The helper passed in is the router the handler was dispatched from, so
/// handlers can reply, defer, edit or follow up.
#[async_trait]
pub trait InteractionHandler: Send + Sync {
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError>;
}

/// Adapts an async closure into an [`InteractionHandler`].
pub struct FnHandler<F> {
    func: F,
}

/// Wrap a closure returning a boxed future as a handler.
///
/// ```rust,no_run
/// use discord_webhook_core::{handler_fn, HandlerError};
///
/// let handler = handler_fn(|helper, interaction| {
///     Box::pin(async move {
///         helper.reply(interaction, "Pong!").await?;
///         Ok::<(), HandlerError>(())
///     })
/// });
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a DiscordHelper, &'a Interaction) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync
        + 'static,
{
    FnHandler { func }
}

#[async_trait]
impl<F> InteractionHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a DiscordHelper, &'a Interaction) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync
        + 'static,
{
    async fn handle(
        &self,
        helper: &DiscordHelper,
        interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        (self.func)(helper, interaction).await
    }
}

/// Category-keyed handler lists. Insertion order is invocation order.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<EventCategory, Vec<Arc<dyn InteractionHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, category: EventCategory, handler: Arc<dyn InteractionHandler>) {
        self.handlers.entry(category).or_default().push(handler);
    }

    pub fn handlers_for(&self, category: EventCategory) -> &[Arc<dyn InteractionHandler>] {
        self.handlers
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Handlers to run for an interaction of `category`: the wildcard
    /// handlers first, then the category's own.
    pub fn collect(&self, category: Option<EventCategory>) -> Vec<Arc<dyn InteractionHandler>> {
        let mut selected = self.handlers_for(EventCategory::Any).to_vec();
        if let Some(category) = category.filter(|c| *c != EventCategory::Any) {
            selected.extend(self.handlers_for(category).iter().cloned());
        }
        selected
    }

    pub fn len(&self, category: EventCategory) -> usize {
        self.handlers_for(category).len()
    }

    pub fn total(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<String, usize> = self
            .handlers
            .iter()
            .map(|(category, list)| (category.to_string(), list.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
