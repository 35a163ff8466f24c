use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::message::{ChatMessage, Sender};

/// Words of the first user message used for the derived session name
const NAME_WORDS: usize = 4;
const NAME_MAX_CHARS: usize = 40;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A named, timestamped container of chat messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub name: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new() -> Self {
        let now = Utc::now();
        let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);

        Self {
            id: format!("session-{}-{}", now.timestamp_millis(), counter),
            name: fallback_name(now),
            messages: Vec::new(),
            updated_at: now,
        }
    }

    /// Append a message, bumping the timestamp and deriving the session name
    /// from the first user message.
    pub fn push(&mut self, message: ChatMessage) {
        if message.sender == Sender::User && !self.has_user_message() {
            if let Some(name) = derive_name(&message.text) {
                self.name = name;
            }
        }

        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.sender == Sender::User)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact listing entry for the session picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&ChatSession> for SessionSummary {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id.clone(),
            name: session.name.clone(),
            updated_at: session.updated_at,
        }
    }
}

fn derive_name(first_message: &str) -> Option<String> {
    let words: Vec<&str> = first_message.split_whitespace().take(NAME_WORDS).collect();
    if words.is_empty() {
        return None;
    }

    let mut name = words.join(" ");
    if name.chars().count() > NAME_MAX_CHARS {
        name = name.chars().take(NAME_MAX_CHARS).collect();
    }

    Some(name)
}

fn fallback_name(now: DateTime<Utc>) -> String {
    format!("Chat {}", now.format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids() {
        let a = ChatSession::new();
        let b = ChatSession::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_name_from_first_user_message() {
        let mut session = ChatSession::new();
        session.push(ChatMessage::new(Sender::Agent, "Hello! How can I help?"));
        session.push(ChatMessage::new(
            Sender::User,
            "show me the status of my repo please",
        ));

        assert_eq!(session.name, "show me the status");
    }

    #[test]
    fn test_name_not_overwritten_by_later_messages() {
        let mut session = ChatSession::new();
        session.push(ChatMessage::new(Sender::User, "first request"));
        session.push(ChatMessage::new(Sender::User, "second request"));

        assert_eq!(session.name, "first request");
    }

    #[test]
    fn test_fallback_name_without_user_message() {
        let session = ChatSession::new();
        assert!(session.name.starts_with("Chat "));
    }

    #[test]
    fn test_long_first_message_truncated() {
        let mut session = ChatSession::new();
        session.push(ChatMessage::new(
            Sender::User,
            "pleasepleasepleasepleasepleaseplease explainexplainexplainexplain everythingeverything aboutabout",
        ));

        assert!(session.name.chars().count() <= 40);
    }

    #[test]
    fn test_push_updates_timestamp() {
        let mut session = ChatSession::new();
        let before = session.updated_at;
        session.push(ChatMessage::new(Sender::User, "hi"));

        assert!(session.updated_at >= before);
    }
}
