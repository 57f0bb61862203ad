//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "discord-webhook-service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Example Discord interactions bot served over HTTP")]
pub struct Cli {
    /// Configuration file (YAML), applied after config/service.yaml
    #[arg(short, long, env = "DISCORD_WEBHOOK_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Register the example slash commands before serving
    #[arg(long)]
    pub register_commands: bool,

    /// Register commands in this guild instead of globally
    #[arg(long, requires = "register_commands")]
    pub guild_id: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
