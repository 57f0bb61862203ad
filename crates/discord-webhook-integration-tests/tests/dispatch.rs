//! End-to-end tests for routing verified interactions to handlers

mod common;

use axum::http::StatusCode;
use axum::routing::{post, MethodRouter};
use common::{
    app, autocomplete_payload, body_json, button_payload, command_payload, plugin_against,
    plugin_with_client, signed_request, Counter, Failing, RecordingClient, SharedBuffer,
};
use discord_webhook_api::{dispatch_and_respond, Discord};
use discord_webhook_core::{
    AutocompleteChoice, ConsoleLogger, DiscordError, EventCategory, HandlerError,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Route that replies "Pong!" to `/ping`.
fn ping_route() -> MethodRouter {
    post(|Discord(helper): Discord| async move {
        let mut helper = helper.expect("verified interaction");
        helper.on_fn(EventCategory::Command, |helper, interaction| {
            Box::pin(async move {
                if interaction.command_name() == Some("ping") {
                    helper.reply(interaction, "Pong!").await?;
                }
                Ok::<(), HandlerError>(())
            })
        });
        dispatch_and_respond(&helper).await
    })
}

/// Route that registers the given counters per category.
fn counting_route(commands: Vec<Counter>, wildcards: Vec<Counter>, buttons: Vec<Counter>) -> MethodRouter {
    post(move |Discord(helper): Discord| {
        let (commands, wildcards, buttons) = (commands.clone(), wildcards.clone(), buttons.clone());
        async move {
            let mut helper = helper.expect("verified interaction");
            for counter in commands {
                helper.on(EventCategory::Command, counter);
            }
            for counter in wildcards {
                helper.on(EventCategory::Any, counter);
            }
            for counter in buttons {
                helper.on(EventCategory::Button, counter);
            }
            dispatch_and_respond(&helper).await
        }
    })
}

fn counters(n: usize) -> Vec<Counter> {
    (0..n).map(|_| Counter::default()).collect()
}

fn total(counters: &[Counter]) -> usize {
    counters.iter().map(Counter::hits).sum()
}

// ============================================================================
// Handler selection
// ============================================================================

/// Commands reach command and wildcard handlers only
#[tokio::test]
async fn test_command_invokes_command_and_wildcard_handlers() {
    let (commands, wildcards, buttons) = (counters(3), counters(2), counters(4));
    let plugin = plugin_with_client(Arc::new(RecordingClient::default()), ConsoleLogger::disabled());
    let app = app(
        plugin,
        counting_route(commands.clone(), wildcards.clone(), buttons.clone()),
    );

    let response = app
        .oneshot(signed_request(&command_payload("anything")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(total(&commands), 3);
    assert_eq!(total(&wildcards), 2);
    assert_eq!(total(&buttons), 0);
}

/// Buttons reach button and wildcard handlers, never command handlers
#[tokio::test]
async fn test_button_never_invokes_command_handlers() {
    let (commands, wildcards, buttons) = (counters(3), counters(2), counters(1));
    let plugin = plugin_with_client(Arc::new(RecordingClient::default()), ConsoleLogger::disabled());
    let app = app(
        plugin,
        counting_route(commands.clone(), wildcards.clone(), buttons.clone()),
    );

    app.oneshot(signed_request(&button_payload("b1")))
        .await
        .unwrap();

    assert_eq!(total(&commands), 0);
    assert_eq!(total(&wildcards), 2);
    assert_eq!(total(&buttons), 1);
}

/// Each request gets its own helper, so handlers never accumulate
#[tokio::test]
async fn test_handlers_do_not_leak_between_requests() {
    let commands = counters(1);
    let plugin = plugin_with_client(Arc::new(RecordingClient::default()), ConsoleLogger::disabled());
    let app = app(plugin, counting_route(commands.clone(), vec![], vec![]));

    for _ in 0..3 {
        app.clone()
            .oneshot(signed_request(&command_payload("ping")))
            .await
            .unwrap();
    }

    assert_eq!(total(&commands), 3);
}

// ============================================================================
// Failures
// ============================================================================

/// One failing handler fails the request and skips the success log
#[tokio::test]
async fn test_failing_handler_fails_dispatch() {
    let console = SharedBuffer::default();
    let logger = ConsoleLogger::with_writer(true, false, Box::new(console.clone()));
    let plugin = plugin_with_client(Arc::new(RecordingClient::default()), logger);
    let route = post(|Discord(helper): Discord| async move {
        let mut helper = helper.expect("verified interaction");
        helper
            .on(EventCategory::Any, Counter::default())
            .on(EventCategory::Command, Failing);
        dispatch_and_respond(&helper).await
    });

    let response = app(plugin, route)
        .oneshot(signed_request(&command_payload("ping")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Interaction handler failed" })
    );
    let output = console.contents();
    assert!(output.contains("handler exploded"));
    assert!(!output.contains("Interaction handlers completed"));
}

/// The success log is written when every handler succeeds
#[tokio::test]
async fn test_successful_dispatch_logs_completion() {
    let console = SharedBuffer::default();
    let logger = ConsoleLogger::with_writer(true, false, Box::new(console.clone()));
    let plugin = plugin_with_client(Arc::new(RecordingClient::default()), logger);

    app(plugin, ping_route())
        .oneshot(signed_request(&command_payload("ping")))
        .await
        .unwrap();

    assert!(console.contents().contains("Interaction handlers completed"));
}

/// Replying to an autocomplete request is refused before any callback
#[tokio::test]
async fn test_reply_to_autocomplete_is_not_repliable() {
    let client = Arc::new(RecordingClient::default());
    let plugin = plugin_with_client(client.clone(), ConsoleLogger::disabled());
    let route = post(|Discord(helper): Discord| async move {
        let helper = helper.expect("verified interaction");
        let interaction = helper.interaction().expect("bound interaction").clone();
        let err = helper.reply(&interaction, "nope").await.unwrap_err();
        assert!(matches!(err, DiscordError::NotRepliable { .. }));
        StatusCode::NO_CONTENT
    });

    let response = app(plugin, route)
        .oneshot(signed_request(&autocomplete_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(client.callbacks().is_empty());
}

// ============================================================================
// Responses
// ============================================================================

/// `/ping` end to end records an immediate message with "Pong!"
#[tokio::test]
async fn test_ping_command_replies_pong() {
    let client = Arc::new(RecordingClient::default());
    let plugin = plugin_with_client(client.clone(), ConsoleLogger::disabled());

    let response = app(plugin, ping_route())
        .oneshot(signed_request(&command_payload("ping")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "type": 4, "data": { "content": "Pong!" } })
    );
    assert_eq!(
        client.callbacks(),
        vec![json!({ "type": 4, "data": { "content": "Pong!" } })]
    );
}

/// Autocomplete requests are routed to autocomplete handlers
#[tokio::test]
async fn test_autocomplete_choices_are_returned() {
    let plugin = plugin_with_client(Arc::new(RecordingClient::default()), ConsoleLogger::disabled());
    let route = post(|Discord(helper): Discord| async move {
        let mut helper = helper.expect("verified interaction");
        helper.on_fn(EventCategory::Autocomplete, |helper, interaction| {
            Box::pin(async move {
                let choices = vec![
                    AutocompleteChoice::new("hello", "hello"),
                    AutocompleteChoice::new("help", "help"),
                ];
                helper.respond_autocomplete(interaction, choices).await?;
                Ok::<(), HandlerError>(())
            })
        });
        dispatch_and_respond(&helper).await
    });

    let response = app(plugin, route)
        .oneshot(signed_request(&autocomplete_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["type"], 8);
    assert_eq!(body["data"]["choices"][1]["name"], "help");
}

// ============================================================================
// Against a mock Discord API
// ============================================================================

/// The reply is posted to the callback endpoint of the interaction
#[tokio::test]
async fn test_reply_is_delivered_to_callback_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/interactions/100/interaction-token/callback"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(plugin_against(&server.uri()), ping_route())
        .oneshot(signed_request(&command_payload("ping")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let requests = server.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent, json!({ "type": 4, "data": { "content": "Pong!" } }));
}

/// A rate-limited callback fails the request
#[tokio::test]
async fn test_rate_limited_callback_fails_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/interactions/100/interaction-token/callback"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "message": "You are being rate limited.",
            "retry_after": 1.5,
            "global": false
        })))
        .mount(&server)
        .await;

    let response = app(plugin_against(&server.uri()), ping_route())
        .oneshot(signed_request(&command_payload("ping")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
