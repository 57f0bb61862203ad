//! Typed view over inbound interaction payloads.
//!
//! Discord delivers every interaction as a JSON document whose shape depends on
//! its `type` discriminant. [`Interaction`] exposes the fields the router and
//! handlers need, keeps the full raw document for everything else, and derives
//! the [`EventCategory`] used to select handlers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Discriminants
// ============================================================================

/// Interaction `type` discriminant.
///
/// Unknown values are preserved rather than rejected so that new interaction
/// kinds still reach wildcard handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    ApplicationCommandAutocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::ApplicationCommandAutocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

impl From<InteractionType> for u8 {
    fn from(value: InteractionType) -> Self {
        match value {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::ApplicationCommandAutocomplete => 4,
            InteractionType::ModalSubmit => 5,
            InteractionType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping => write!(f, "ping"),
            Self::ApplicationCommand => write!(f, "application_command"),
            Self::MessageComponent => write!(f, "message_component"),
            Self::ApplicationCommandAutocomplete => write!(f, "autocomplete"),
            Self::ModalSubmit => write!(f, "modal_submit"),
            Self::Unknown(value) => write!(f, "unknown({})", value),
        }
    }
}

/// Message component `component_type` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ComponentType {
    ActionRow,
    Button,
    StringSelect,
    TextInput,
    UserSelect,
    RoleSelect,
    MentionableSelect,
    ChannelSelect,
    Unknown(u8),
}

impl ComponentType {
    /// True for every select-menu flavour.
    pub fn is_select_menu(self) -> bool {
        matches!(
            self,
            Self::StringSelect
                | Self::UserSelect
                | Self::RoleSelect
                | Self::MentionableSelect
                | Self::ChannelSelect
        )
    }
}

impl From<u8> for ComponentType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::ActionRow,
            2 => Self::Button,
            3 => Self::StringSelect,
            4 => Self::TextInput,
            5 => Self::UserSelect,
            6 => Self::RoleSelect,
            7 => Self::MentionableSelect,
            8 => Self::ChannelSelect,
            other => Self::Unknown(other),
        }
    }
}

impl From<ComponentType> for u8 {
    fn from(value: ComponentType) -> Self {
        match value {
            ComponentType::ActionRow => 1,
            ComponentType::Button => 2,
            ComponentType::StringSelect => 3,
            ComponentType::TextInput => 4,
            ComponentType::UserSelect => 5,
            ComponentType::RoleSelect => 6,
            ComponentType::MentionableSelect => 7,
            ComponentType::ChannelSelect => 8,
            ComponentType::Unknown(other) => other,
        }
    }
}

/// Handler category an interaction is routed to.
///
/// `Any` is the wildcard: its handlers run for every dispatched interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Command,
    Button,
    Select,
    Modal,
    Autocomplete,
    Any,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Command => "command",
            Self::Button => "button",
            Self::Select => "select",
            Self::Modal => "modal",
            Self::Autocomplete => "autocomplete",
            Self::Any => "*",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Payload types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Option<String>,
}

/// One option of an application command, possibly nested for subcommands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type", default)]
    pub option_type: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub focused: bool,
}

/// The `data` object. Which fields are populated depends on the interaction type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    // Application commands and autocomplete
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub command_type: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,

    // Message components and modal submissions
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub component_type: Option<ComponentType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
}

/// A verified inbound interaction.
///
/// The interaction token is never serialized or printed in debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default)]
    pub version: Option<u8>,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub guild_locale: Option<String>,
    #[serde(skip)]
    raw: Value,
}

impl Interaction {
    /// Build an interaction from an already-parsed JSON document, keeping the
    /// document as the raw payload.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut interaction: Interaction = serde_json::from_value(value.clone())?;
        interaction.raw = value;
        Ok(interaction)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// The payload exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn is_ping(&self) -> bool {
        self.kind == InteractionType::Ping
    }

    pub fn is_command(&self) -> bool {
        self.kind == InteractionType::ApplicationCommand
    }

    pub fn is_message_component(&self) -> bool {
        self.kind == InteractionType::MessageComponent
    }

    pub fn is_button(&self) -> bool {
        self.is_message_component() && self.component_type() == Some(ComponentType::Button)
    }

    pub fn is_select_menu(&self) -> bool {
        self.is_message_component()
            && self
                .component_type()
                .map(ComponentType::is_select_menu)
                .unwrap_or(false)
    }

    pub fn is_modal_submit(&self) -> bool {
        self.kind == InteractionType::ModalSubmit
    }

    pub fn is_autocomplete(&self) -> bool {
        self.kind == InteractionType::ApplicationCommandAutocomplete
    }

    /// Whether the reply family (reply, defer, edit, follow-up) may be used.
    ///
    /// Pings and autocomplete requests cannot carry a message response.
    pub fn is_repliable(&self) -> bool {
        matches!(
            self.kind,
            InteractionType::ApplicationCommand
                | InteractionType::MessageComponent
                | InteractionType::ModalSubmit
        )
    }

    /// The handler category selected by this interaction's shape, if any.
    pub fn category(&self) -> Option<EventCategory> {
        if self.is_command() {
            Some(EventCategory::Command)
        } else if self.is_button() {
            Some(EventCategory::Button)
        } else if self.is_select_menu() {
            Some(EventCategory::Select)
        } else if self.is_modal_submit() {
            Some(EventCategory::Modal)
        } else if self.is_autocomplete() {
            Some(EventCategory::Autocomplete)
        } else {
            None
        }
    }

    pub fn component_type(&self) -> Option<ComponentType> {
        self.data.as_ref().and_then(|d| d.component_type)
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.name.as_deref())
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.custom_id.as_deref())
    }

    /// Selected values of a select-menu interaction.
    pub fn values(&self) -> &[String] {
        self.data
            .as_ref()
            .map(|d| d.values.as_slice())
            .unwrap_or_default()
    }

    /// The user who triggered the interaction, in a guild or in a DM.
    pub fn invoking_user(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }

    /// Top-level command option by name.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.data
            .as_ref()
            .and_then(|d| d.options.iter().find(|o| o.name == name))
    }

    /// String value of a top-level command option.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name)
            .and_then(|o| o.value.as_ref())
            .and_then(Value::as_str)
    }

    /// The option currently being typed in an autocomplete request.
    pub fn focused_option(&self) -> Option<&CommandOption> {
        fn find(options: &[CommandOption]) -> Option<&CommandOption> {
            options
                .iter()
                .find_map(|o| if o.focused { Some(o) } else { find(&o.options) })
        }
        self.data.as_ref().and_then(|d| find(&d.options))
    }

    /// Value of a text input in a modal submission, looked up by custom id.
    pub fn modal_value(&self, custom_id: &str) -> Option<&str> {
        let rows = &self.data.as_ref()?.components;
        rows.iter()
            .filter_map(|row| row.get("components").and_then(Value::as_array))
            .flatten()
            .find(|input| input.get("custom_id").and_then(Value::as_str) == Some(custom_id))
            .and_then(|input| input.get("value"))
            .and_then(Value::as_str)
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("application_id", &self.application_id)
            .field("kind", &self.kind)
            .field("data", &self.data)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("token", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "interaction_tests.rs"]
mod tests;
