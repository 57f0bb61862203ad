//! Test doubles shared by the unit tests of this crate.

use async_trait::async_trait;
use discord_webhook_core::{
    ApiError, ConsoleLogger, InteractionClient, InteractionResponse, MessagePayload, PluginConfig,
    SignatureVerifier,
};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::plugin::DiscordPlugin;

pub const TIMESTAMP: &str = "1700000000";

/// Verifier with a fixed answer that counts its calls.
pub struct StaticVerifier {
    pub accept: bool,
    pub calls: Mutex<usize>,
}

impl StaticVerifier {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SignatureVerifier for StaticVerifier {
    async fn verify(&self, _body: &[u8], _signature: &str, _timestamp: &str) -> bool {
        *self.calls.lock().unwrap() += 1;
        self.accept
    }
}

/// REST client that records interaction callbacks and never fails.
#[derive(Default)]
pub struct RecordingClient {
    pub callbacks: Mutex<Vec<(String, Value)>>,
}

impl RecordingClient {
    pub fn callback_count(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }
}

#[async_trait]
impl InteractionClient for RecordingClient {
    async fn create_response(
        &self,
        interaction_id: &str,
        _token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError> {
        self.callbacks
            .lock()
            .unwrap()
            .push((interaction_id.to_string(), serde_json::to_value(response)?));
        Ok(())
    }

    async fn edit_original_response(
        &self,
        _application_id: &str,
        _token: &str,
        _message: &MessagePayload,
    ) -> Result<Value, ApiError> {
        Ok(json!({}))
    }

    async fn delete_original_response(
        &self,
        _application_id: &str,
        _token: &str,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    async fn create_followup(
        &self,
        _application_id: &str,
        _token: &str,
        _message: &MessagePayload,
    ) -> Result<Value, ApiError> {
        Ok(json!({}))
    }

    async fn register_global_commands(
        &self,
        _application_id: &str,
        _commands: &[Value],
    ) -> Result<Value, ApiError> {
        Ok(json!([]))
    }

    async fn register_guild_commands(
        &self,
        _application_id: &str,
        _guild_id: &str,
        _commands: &[Value],
    ) -> Result<Value, ApiError> {
        Ok(json!([]))
    }
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn public_key_hex() -> String {
    hex::encode(signing_key().verifying_key().as_bytes())
}

pub fn sign(timestamp: &str, body: &str) -> String {
    let message = format!("{}{}", timestamp, body);
    hex::encode(signing_key().sign(message.as_bytes()).to_bytes())
}

pub fn plugin_config() -> PluginConfig {
    PluginConfig::new(public_key_hex(), "bot-token", "app-id")
}

/// Plugin with the given verifier and a recording client.
pub fn plugin_with(
    verifier: Arc<dyn SignatureVerifier>,
    client: Arc<RecordingClient>,
) -> Arc<DiscordPlugin> {
    Arc::new(
        DiscordPlugin::with_components(
            plugin_config(),
            verifier,
            client,
            Arc::new(ConsoleLogger::disabled()),
        )
        .expect("valid plugin"),
    )
}
