use serde::{Deserialize, Serialize};

use crate::chat::message::ChatMessage;
use crate::chat::session::SessionSummary;

/// Action button ids the panel can send back
pub mod action_ids {
    pub const CONFIRM_COMMIT: &str = "confirmCommit";
    pub const PUSH_AFTER_COMMIT: &str = "pushAfterCommit";
    pub const UNDO_COMMIT: &str = "undoCommit";
    pub const CONFIRM_EXECUTE: &str = "confirmExecute";
    pub const CANCEL_EXECUTE: &str = "cancelExecute";
}

/// Quick-access buttons rendered above the input box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickAction {
    Status,
    History,
    GenerateCommit,
    PushCommit,
    Pull,
    Fetch,
    Checkout,
}

impl QuickAction {
    /// The canned request a quick button stands for
    pub fn request_text(&self) -> &'static str {
        match self {
            QuickAction::Status => "Show me git status",
            QuickAction::History => {
                "Show me recent commit history in pretty format with authors and short dates"
            }
            QuickAction::GenerateCommit => "Generate commit message based on changes",
            QuickAction::PushCommit => "Push commits to the remote repository",
            QuickAction::Pull => "Pull changes from the remote repository",
            QuickAction::Fetch => "Fetch latest info from remote (git fetch)",
            QuickAction::Checkout => "I want to switch to another branch",
        }
    }

    /// Id used by `setButtonsState` to address this button
    pub fn button_id(&self) -> &'static str {
        match self {
            QuickAction::Status => "status",
            QuickAction::History => "history",
            QuickAction::GenerateCommit => "generateCommit",
            QuickAction::PushCommit => "pushCommit",
            QuickAction::Pull => "pull",
            QuickAction::Fetch => "fetch",
            QuickAction::Checkout => "checkout",
        }
    }
}

/// Envelopes arriving from the host panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Inbound {
    SendMessage { text: String },
    ExecuteCommand { command: String },
    ClearHistory,
    QuickButton { id: QuickAction },
    ActionButton { command_id: String },
    ChangeModel { model: String },
    NewChat,
    LoadHistory { session_id: String },
}

/// Envelopes posted back to the host panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Outbound {
    /// Echo of an inbound user message
    AddMessage { message: ChatMessage },
    /// Agent/system/git/error message, possibly carrying action buttons
    AddResponse { message: ChatMessage },
    SetLoading { loading: bool },
    /// Buttons to disable; everything not listed is re-enabled
    SetButtonsState { disabled: Vec<String> },
    UpdateHistoryList { sessions: Vec<SessionSummary> },
    ClearChat,
    LoadChatHistory { messages: Vec<ChatMessage> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_wire_format() {
        let inbound: Inbound =
            serde_json::from_str(r#"{"type": "sendMessage", "text": "download updates"}"#).unwrap();

        assert_eq!(
            inbound,
            Inbound::SendMessage {
                text: "download updates".to_string()
            }
        );
    }

    #[test]
    fn test_inbound_quick_button() {
        let inbound: Inbound =
            serde_json::from_str(r#"{"type": "quickButton", "id": "generateCommit"}"#).unwrap();

        assert_eq!(
            inbound,
            Inbound::QuickButton {
                id: QuickAction::GenerateCommit
            }
        );
    }

    #[test]
    fn test_inbound_bare_variants() {
        assert_eq!(
            serde_json::from_str::<Inbound>(r#"{"type": "newChat"}"#).unwrap(),
            Inbound::NewChat
        );
        assert_eq!(
            serde_json::from_str::<Inbound>(r#"{"type": "clearHistory"}"#).unwrap(),
            Inbound::ClearHistory
        );
    }

    #[test]
    fn test_outbound_wire_format() {
        let json = serde_json::to_string(&Outbound::SetLoading { loading: true }).unwrap();
        assert_eq!(json, r#"{"type":"setLoading","loading":true}"#);
    }

    #[test]
    fn test_camel_case_field_names() {
        let inbound: Inbound =
            serde_json::from_str(r#"{"type": "actionButton", "commandId": "confirmCommit"}"#)
                .unwrap();

        assert_eq!(
            inbound,
            Inbound::ActionButton {
                command_id: "confirmCommit".to_string()
            }
        );

        let json = serde_json::to_string(&Inbound::LoadHistory {
            session_id: "session-1".to_string(),
        })
        .unwrap();
        assert!(json.contains("sessionId"));
    }

    #[test]
    fn test_unknown_inbound_type_rejected() {
        assert!(serde_json::from_str::<Inbound>(r#"{"type": "reboot"}"#).is_err());
    }
}
