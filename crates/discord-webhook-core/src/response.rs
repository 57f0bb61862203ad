//! Outbound message payloads and interaction responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message flag that makes a response visible only to the invoking user.
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

// ============================================================================
// Message payloads
// ============================================================================

/// Content of a message sent in response to an interaction.
///
/// Embeds and components are kept as raw JSON; their schema belongs to the
/// platform and is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<Value>,
}

impl MessagePayload {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_embed(mut self, embed: Value) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_component(mut self, component: Value) -> Self {
        self.components.push(component);
        self
    }

    /// Mark the message as visible only to the invoking user.
    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or(0) | EPHEMERAL_FLAG);
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags.map(|f| f & EPHEMERAL_FLAG != 0).unwrap_or(false)
    }
}

impl From<&str> for MessagePayload {
    fn from(content: &str) -> Self {
        Self::content(content)
    }
}

impl From<String> for MessagePayload {
    fn from(content: String) -> Self {
        Self::content(content)
    }
}

/// Options for a deferred reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferOptions {
    pub ephemeral: bool,
}

impl DeferOptions {
    pub fn ephemeral() -> Self {
        Self { ephemeral: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: Value,
}

impl AutocompleteChoice {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A modal dialog shown in response to a command or component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalPayload {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<Value>,
}

// ============================================================================
// Interaction responses
// ============================================================================

/// Interaction callback type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CallbackType {
    Pong,
    ChannelMessageWithSource,
    DeferredChannelMessageWithSource,
    DeferredUpdateMessage,
    UpdateMessage,
    AutocompleteResult,
    Modal,
}

impl From<CallbackType> for u8 {
    fn from(value: CallbackType) -> Self {
        match value {
            CallbackType::Pong => 1,
            CallbackType::ChannelMessageWithSource => 4,
            CallbackType::DeferredChannelMessageWithSource => 5,
            CallbackType::DeferredUpdateMessage => 6,
            CallbackType::UpdateMessage => 7,
            CallbackType::AutocompleteResult => 8,
            CallbackType::Modal => 9,
        }
    }
}

impl TryFrom<u8> for CallbackType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pong),
            4 => Ok(Self::ChannelMessageWithSource),
            5 => Ok(Self::DeferredChannelMessageWithSource),
            6 => Ok(Self::DeferredUpdateMessage),
            7 => Ok(Self::UpdateMessage),
            8 => Ok(Self::AutocompleteResult),
            9 => Ok(Self::Modal),
            other => Err(format!("unknown interaction callback type {}", other)),
        }
    }
}

/// The `data` member of an interaction response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Message(MessagePayload),
    Autocomplete { choices: Vec<AutocompleteChoice> },
    Modal(ModalPayload),
}

/// Body of an interaction callback: `{"type": <callback>, "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: CallbackType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: CallbackType::Pong,
            data: None,
        }
    }

    pub fn message(message: MessagePayload) -> Self {
        Self {
            kind: CallbackType::ChannelMessageWithSource,
            data: Some(ResponseData::Message(message)),
        }
    }

    pub fn deferred(options: DeferOptions) -> Self {
        let data = options.ephemeral.then(|| {
            ResponseData::Message(MessagePayload {
                flags: Some(EPHEMERAL_FLAG),
                ..Default::default()
            })
        });
        Self {
            kind: CallbackType::DeferredChannelMessageWithSource,
            data,
        }
    }

    pub fn deferred_update() -> Self {
        Self {
            kind: CallbackType::DeferredUpdateMessage,
            data: None,
        }
    }

    pub fn update(message: MessagePayload) -> Self {
        Self {
            kind: CallbackType::UpdateMessage,
            data: Some(ResponseData::Message(message)),
        }
    }

    pub fn autocomplete(choices: Vec<AutocompleteChoice>) -> Self {
        Self {
            kind: CallbackType::AutocompleteResult,
            data: Some(ResponseData::Autocomplete { choices }),
        }
    }

    pub fn modal(modal: ModalPayload) -> Self {
        Self {
            kind: CallbackType::Modal,
            data: Some(ResponseData::Modal(modal)),
        }
    }

    /// Message content carried by this response, if any.
    pub fn content(&self) -> Option<&str> {
        match &self.data {
            Some(ResponseData::Message(message)) => message.content.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Response record
// ============================================================================

/// Which operation produced the recorded response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Reply,
    DeferredReply,
    DeferredUpdate,
    UpdateMessage,
    Edit,
    Autocomplete,
    Modal,
}

/// The last response produced for an interaction.
///
/// `response` is the body the downstream route returns over HTTP. An edit is
/// recorded as an immediate channel message carrying the edited content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub kind: ResponseKind,
    pub response: InteractionResponse,
    pub recorded_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(kind: ResponseKind, response: InteractionResponse) -> Self {
        Self {
            kind,
            response,
            recorded_at: Utc::now(),
        }
    }

    pub fn content(&self) -> Option<&str> {
        self.response.content()
    }

    /// True when the record is an immediate channel-message response.
    pub fn is_channel_message(&self) -> bool {
        self.response.kind == CallbackType::ChannelMessageWithSource
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
