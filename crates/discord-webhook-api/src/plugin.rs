//! The webhook plugin: validated configuration plus the shared collaborators
//! every request uses.

use axum::{middleware, Router};
use discord_webhook_core::{
    ClientConfig, ConsoleLogger, DiscordError, DiscordHelper, Ed25519Verifier, Interaction,
    InteractionClient, PluginConfig, ReqwestInteractionClient, SignatureVerifier,
};
use std::sync::Arc;
use tracing::info;

use crate::hook::interaction_hook;

/// Default upper bound on an interaction request body.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Immutable per-application state shared by all requests.
///
/// Construct once at startup, wrap in an `Arc`, and [`install`](Self::install)
/// it on the router that serves the interactions endpoint.
pub struct DiscordPlugin {
    config: PluginConfig,
    verifier: Arc<dyn SignatureVerifier>,
    client: Arc<dyn InteractionClient>,
    logger: Arc<ConsoleLogger>,
    max_body_size: usize,
}

impl DiscordPlugin {
    /// Build the plugin from configuration.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if a required field is missing, the
    /// public key is not a valid Ed25519 key, or the REST client cannot be
    /// built.
    pub fn new(config: PluginConfig) -> Result<Self, DiscordError> {
        Self::with_client_config(config, ClientConfig::default())
    }

    /// Like [`new`](Self::new) with custom REST client settings.
    pub fn with_client_config(
        config: PluginConfig,
        client_config: ClientConfig,
    ) -> Result<Self, DiscordError> {
        config.validate()?;
        let verifier = Ed25519Verifier::from_hex(&config.public_key)?;
        let client = ReqwestInteractionClient::new(config.bot_token.clone(), client_config)
            .map_err(|e| {
                DiscordError::configuration("bot_token", format!("Failed to build REST client: {}", e))
            })?;
        let logger = ConsoleLogger::new(config.verbose);

        Self::with_components(
            config,
            Arc::new(verifier),
            Arc::new(client),
            Arc::new(logger),
        )
    }

    /// Assemble a plugin from explicit collaborators.
    ///
    /// The configuration is still validated; the public key is not parsed
    /// since the verifier is supplied.
    pub fn with_components(
        config: PluginConfig,
        verifier: Arc<dyn SignatureVerifier>,
        client: Arc<dyn InteractionClient>,
        logger: Arc<ConsoleLogger>,
    ) -> Result<Self, DiscordError> {
        config.validate()?;
        info!(
            application_id = %config.application_id,
            verbose = config.verbose,
            "Discord plugin initialized"
        );
        Ok(Self {
            config,
            verifier,
            client,
            logger,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        })
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn application_id(&self) -> &str {
        &self.config.application_id
    }

    pub fn verifier(&self) -> &Arc<dyn SignatureVerifier> {
        &self.verifier
    }

    pub fn client(&self) -> &Arc<dyn InteractionClient> {
        &self.client
    }

    pub fn logger(&self) -> &Arc<ConsoleLogger> {
        &self.logger
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    /// A fresh router for one request, bound to `interaction` if present.
    pub fn helper(&self, interaction: Option<Arc<Interaction>>) -> DiscordHelper {
        DiscordHelper::new(
            interaction,
            self.client.clone(),
            self.config.application_id.clone(),
            self.logger.clone(),
        )
    }

    /// Run the entry hook in front of every route of `router`.
    pub fn install<S>(self: Arc<Self>, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, interaction_hook))
    }
}

impl std::fmt::Debug for DiscordPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordPlugin")
            .field("config", &self.config)
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
