use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a chat message is attributed to in the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    System,
    Git,
    Error,
}

/// A button offered alongside a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAction {
    pub label: String,
    pub command_id: String,
    #[serde(default)]
    pub is_secondary: bool,
}

impl MessageAction {
    pub fn primary(label: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command_id: command_id.into(),
            is_secondary: false,
        }
    }

    pub fn secondary(label: impl Into<String>, command_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command_id: command_id.into(),
            is_secondary: true,
        }
    }
}

/// One turn in the conversation; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<MessageAction>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            actions: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_actions(
        sender: Sender,
        text: impl Into<String>,
        actions: Vec<MessageAction>,
    ) -> Self {
        Self {
            sender,
            text: text.into(),
            actions,
            timestamp: Utc::now(),
        }
    }
}
