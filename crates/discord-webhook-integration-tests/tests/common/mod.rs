//! Common test utilities for the Discord webhook integration tests
//!
//! This module provides:
//! - A fixed signing key and request signing
//! - Interaction payload builders
//! - A recording REST client and counting handlers
//! - Plugin and router construction helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    routing::MethodRouter,
    Router,
};
use discord_webhook_api::{create_router, DiscordPlugin, ServiceConfig};
use discord_webhook_core::{
    ApiError, ClientConfig, ConsoleLogger, DiscordHelper, Ed25519Verifier, HandlerError,
    Interaction, InteractionClient, InteractionHandler, InteractionResponse, MessagePayload,
    PluginConfig,
};
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TIMESTAMP: &str = "1700000000";
pub const APPLICATION_ID: &str = "app-123";

// ============================================================================
// Signing
// ============================================================================

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

pub fn public_key_hex() -> String {
    hex::encode(signing_key().verifying_key().as_bytes())
}

/// Hex signature over `timestamp || body`.
pub fn sign(timestamp: &str, body: &str) -> String {
    let message = format!("{}{}", timestamp, body);
    hex::encode(signing_key().sign(message.as_bytes()).to_bytes())
}

/// POST to `/interactions` signed with the test key.
pub fn signed_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("x-signature-ed25519", sign(TIMESTAMP, body))
        .header("x-signature-timestamp", TIMESTAMP)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Payload builders
// ============================================================================

pub fn ping_payload() -> String {
    json!({ "id": "1", "application_id": APPLICATION_ID, "type": 1, "version": 1 }).to_string()
}

pub fn command_payload(name: &str) -> String {
    json!({
        "id": "100",
        "application_id": APPLICATION_ID,
        "type": 2,
        "token": "interaction-token",
        "guild_id": "g1",
        "member": { "user": { "id": "u1", "username": "tester" } },
        "data": { "id": "c1", "name": name, "type": 1 }
    })
    .to_string()
}

pub fn button_payload(custom_id: &str) -> String {
    json!({
        "id": "200",
        "application_id": APPLICATION_ID,
        "type": 3,
        "token": "interaction-token",
        "user": { "id": "u2", "username": "dm-user" },
        "data": { "custom_id": custom_id, "component_type": 2 }
    })
    .to_string()
}

pub fn autocomplete_payload() -> String {
    json!({
        "id": "300",
        "application_id": APPLICATION_ID,
        "type": 4,
        "token": "interaction-token",
        "data": {
            "name": "echo",
            "options": [{ "name": "text", "type": 3, "value": "he", "focused": true }]
        }
    })
    .to_string()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Recording client
// ============================================================================

/// REST client that records interaction callbacks.
#[derive(Default)]
pub struct RecordingClient {
    callbacks: Mutex<Vec<Value>>,
}

impl RecordingClient {
    pub fn callbacks(&self) -> Vec<Value> {
        self.callbacks.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionClient for RecordingClient {
    async fn create_response(
        &self,
        _interaction_id: &str,
        _token: &str,
        response: &InteractionResponse,
    ) -> Result<(), ApiError> {
        self.callbacks
            .lock()
            .unwrap()
            .push(serde_json::to_value(response)?);
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

// ============================================================================
// Handlers
// ============================================================================

/// Handler that counts its invocations.
#[derive(Clone, Default)]
pub struct Counter {
    hits: Arc<AtomicUsize>,
}

impl Counter {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionHandler for Counter {
    async fn handle(
        &self,
        _helper: &DiscordHelper,
        _interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handler that always fails.
pub struct Failing;

#[async_trait]
impl InteractionHandler for Failing {
    async fn handle(
        &self,
        _helper: &DiscordHelper,
        _interaction: &Interaction,
    ) -> Result<(), HandlerError> {
        Err("handler exploded".into())
    }
}

// ============================================================================
// Console capture
// ============================================================================

/// In-memory sink for the console logger.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Plugin and router
// ============================================================================

pub fn plugin_config() -> PluginConfig {
    PluginConfig::new(public_key_hex(), "bot-token", APPLICATION_ID)
}

/// Plugin with real signature verification and the given client.
pub fn plugin_with_client(
    client: Arc<dyn InteractionClient>,
    logger: ConsoleLogger,
) -> Arc<DiscordPlugin> {
    let verifier = Ed25519Verifier::from_hex(&public_key_hex()).unwrap();
    Arc::new(
        DiscordPlugin::with_components(plugin_config(), Arc::new(verifier), client, Arc::new(logger))
            .unwrap(),
    )
}

/// Plugin whose REST client talks to `api_base_url`.
pub fn plugin_against(api_base_url: &str) -> Arc<DiscordPlugin> {
    Arc::new(
        DiscordPlugin::with_client_config(
            plugin_config(),
            ClientConfig::default().with_api_base_url(api_base_url),
        )
        .unwrap(),
    )
}

pub fn app(plugin: Arc<DiscordPlugin>, interactions: MethodRouter) -> Router {
    create_router(plugin, &ServiceConfig::default(), interactions)
}
