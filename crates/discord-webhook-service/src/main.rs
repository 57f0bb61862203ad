//! # Discord Webhook Service
//!
//! Binary entry point for the example interactions bot.
//!
//! This executable:
//! - Loads configuration from files, the environment and the command line
//! - Initializes logging
//! - Optionally registers the example slash commands
//! - Serves the interactions endpoint from discord-webhook-api

mod bot;
mod cli;

use anyhow::Context;
use clap::Parser;
use discord_webhook_api::{start_server, DiscordPlugin, ServiceConfig, ServiceError};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::ExampleBot;
use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_logging(&config, cli.json_logs);

    info!("Starting Discord webhook service");

    config
        .validate()
        .context("Service configuration is invalid")?;

    let plugin = DiscordPlugin::new(config.discord.clone())
        .context("Failed to initialize the Discord plugin")?
        .with_max_body_size(config.server.max_body_size);
    let plugin = Arc::new(plugin);

    if cli.register_commands {
        bot::register_commands(
            plugin.client().as_ref(),
            plugin.application_id(),
            cli.guild_id.as_deref(),
        )
        .await
        .context("Failed to register slash commands")?;
    }

    let interactions = bot::interactions_route(Arc::new(ExampleBot::new()));

    if let Err(e) = start_server(config, plugin, interactions).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }

    Ok(())
}

// ============================================================================
// Private helpers
// ============================================================================

/// Load configuration.
///
/// Sources, later ones override earlier ones:
///  1. `./config/service.yaml`
///  2. the file given by `--config` or `DISCORD_WEBHOOK_CONFIG_FILE`
///  3. environment variables prefixed `DWH__`, e.g. `DWH__DISCORD__PUBLIC_KEY`
///  4. `--port`
fn load_config(cli: &Cli) -> anyhow::Result<ServiceConfig> {
    let mut builder = config::Config::builder().add_source(
        config::File::with_name("config/service")
            .required(false)
            .format(config::FileFormat::Yaml),
    );

    if let Some(path) = &cli.config {
        builder = builder.add_source(
            config::File::from(path.as_path())
                .required(true)
                .format(config::FileFormat::Yaml),
        );
    }

    let mut service_config: ServiceConfig = builder
        .add_source(config::Environment::with_prefix("DWH").separator("__"))
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Could not deserialize service configuration")?;

    if let Some(port) = cli.port {
        service_config.server.port = port;
    }

    Ok(service_config)
}

/// Install the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_logging(config: &ServiceConfig, json_logs: bool) {
    let level = &config.logging.level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "discord_webhook_service={level},discord_webhook_api={level},discord_webhook_core={level},tower_http=debug"
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs || config.logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
