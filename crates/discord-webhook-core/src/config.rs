//! Plugin configuration.

use serde::{Deserialize, Serialize};

use crate::error::DiscordError;

/// Credentials and switches for one Discord application.
///
/// Validated once when the plugin is built and shared read-only afterwards.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Hex-encoded Ed25519 public key from the developer portal.
    #[serde(default)]
    pub public_key: String,

    #[serde(default, skip_serializing)]
    pub bot_token: String,

    #[serde(default)]
    pub application_id: String,

    /// Enables the developer console output.
    #[serde(default)]
    pub verbose: bool,
}

impl PluginConfig {
    pub fn new(
        public_key: impl Into<String>,
        bot_token: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            bot_token: bot_token.into(),
            application_id: application_id.into(),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check that every required field is present.
    ///
    /// Fields are checked in declaration order; the first blank one is named
    /// in the returned error.
    pub fn validate(&self) -> Result<(), DiscordError> {
        let required = [
            ("public_key", &self.public_key),
            ("bot_token", &self.bot_token),
            ("application_id", &self.application_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DiscordError::missing_field(field));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginConfig")
            .field("public_key", &self.public_key)
            .field("bot_token", &"<REDACTED>")
            .field("application_id", &self.application_id)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
