use std::collections::VecDeque;

use crate::llm::client::LlmMessage;

pub const DEFAULT_HISTORY_CAP: usize = 20;

// Command outputs are summarized into history; anything longer adds cost
// without adding context.
const MAX_RESULT_CHARS: usize = 2000;

/// Bounded conversation context for the model
///
/// Holds the last N user/assistant turns, oldest evicted first. Owned
/// exclusively by the active session; never shared.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<LlmMessage>,
    cap: usize,
}

impl ConversationHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Append an entry, evicting the oldest once the cap is exceeded
    pub fn push(&mut self, message: LlmMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(LlmMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(LlmMessage::assistant(content));
    }

    /// Record a command execution so the model knows what happened
    ///
    /// Shaped as a user-role system note, a format models echo back less
    /// readily than plain assistant text.
    pub fn record_command_result(&mut self, command: &str, result: &str, success: bool) {
        let outcome = if success { "Output" } else { "Error" };
        let result = truncate_chars(result.trim(), MAX_RESULT_CHARS);

        self.push(LlmMessage::user(format!(
            "[SYSTEM: Command \"{command}\" was executed. {outcome}: {result}]"
        )));
    }

    /// Snapshot of the entries in order, for building a model request
    pub fn to_messages(&self) -> Vec<LlmMessage> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max).collect();
    format!("{truncated}... [truncated]")
}
