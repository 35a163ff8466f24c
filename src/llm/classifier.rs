use serde::Deserialize;
use thiserror::Error;

use crate::llm::client::{ChatModel, LLMError, LlmMessage};
use crate::llm::prompts;
use crate::security::rules::DangerRules;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// Structured result of classifying one user request
#[derive(Debug, Clone, PartialEq)]
pub struct CommandIntent {
    /// Human-readable explanation; always present
    pub message: String,
    /// Proposed git command; absent for pure-answer turns
    pub command: Option<String>,
    /// Recomputed from the danger rule table, never trusted from the model
    pub is_dangerous: bool,
}

impl CommandIntent {
    /// True when this turn only carries an explanation
    pub fn is_answer_only(&self) -> bool {
        self.command.is_none()
    }
}

/// Wire shape of the model's JSON reply
#[derive(Deserialize)]
struct RawIntent {
    message: String,
    #[serde(default)]
    command: Option<String>,
    // Accepted but ignored; the local rule table decides
    #[serde(default, rename = "isDangerous")]
    #[allow(dead_code)]
    is_dangerous: bool,
}

/// Classify a free-text user request into a `CommandIntent`
///
/// Dangerous commands are returned, not blocked; the execution layer owns
/// the confirmation gate.
pub async fn classify(
    model: &dyn ChatModel,
    rules: &DangerRules,
    workspace_context: &str,
    history: &[LlmMessage],
    user_text: &str,
) -> Result<CommandIntent, ClassifyError> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(LlmMessage::system(prompts::classify_prompt(
        workspace_context,
    )));
    messages.extend_from_slice(history);
    messages.push(LlmMessage::user(user_text));

    let raw = model.complete(&messages).await?;
    decode_intent(&raw, rules)
}

/// Strictly decode the model reply into a `CommandIntent`
///
/// Markdown fences are tolerated; anything else that fails to parse is a
/// `MalformedResponse`, never a guessed command.
pub fn decode_intent(raw: &str, rules: &DangerRules) -> Result<CommandIntent, ClassifyError> {
    let cleaned = strip_code_fences(raw);

    let raw_intent: RawIntent = serde_json::from_str(cleaned).map_err(|e| {
        ClassifyError::MalformedResponse(format!("not a valid intent object: {e}"))
    })?;

    let command = raw_intent
        .command
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && c != "null");

    if let Some(cmd) = &command {
        if cmd != "git" && !cmd.starts_with("git ") {
            return Err(ClassifyError::MalformedResponse(format!(
                "proposed command is not a git command: {cmd}"
            )));
        }
    }

    let is_dangerous = command
        .as_deref()
        .map(|c| rules.is_dangerous(c))
        .unwrap_or(false);

    Ok(CommandIntent {
        message: raw_intent.message,
        command,
        is_dangerous,
    })
}

/// Strip a surrounding markdown code fence, keeping the body intact
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.starts_with("```") {
        if let Some(first_newline) = text.find('\n') {
            text = &text[first_newline + 1..];
        }
        if let Some(last_fence) = text.rfind("```") {
            text = &text[..last_fence];
        }
        text = text.trim();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DangerRules {
        DangerRules::builtin()
    }

    #[test]
    fn test_decode_plain_intent() {
        let raw = r#"{"message": "Pulling latest changes.", "command": "git pull", "isDangerous": false}"#;
        let intent = decode_intent(raw, &rules()).unwrap();

        assert_eq!(intent.message, "Pulling latest changes.");
        assert_eq!(intent.command.as_deref(), Some("git pull"));
        assert!(!intent.is_dangerous);
    }

    #[test]
    fn test_decode_answer_only_intent() {
        let raw = r#"{"message": "Git status shows the working tree state.", "command": null, "isDangerous": false}"#;
        let intent = decode_intent(raw, &rules()).unwrap();

        assert!(intent.is_answer_only());
    }

    #[test]
    fn test_decode_fenced_json() {
        let raw = "```json\n{\"message\": \"ok\", \"command\": \"git status\", \"isDangerous\": false}\n```";
        let intent = decode_intent(raw, &rules()).unwrap();

        assert_eq!(intent.command.as_deref(), Some("git status"));
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let result = decode_intent("sure, run git pull!", &rules());
        assert!(matches!(result, Err(ClassifyError::MalformedResponse(_))));
    }

    #[test]
    fn test_decode_non_git_command_is_malformed() {
        let raw = r#"{"message": "ok", "command": "rm -rf /", "isDangerous": false}"#;
        let result = decode_intent(raw, &rules());

        assert!(matches!(result, Err(ClassifyError::MalformedResponse(_))));
    }

    #[test]
    fn test_danger_flag_recomputed_upward() {
        // Model claims safe; the rule table knows better
        let raw = r#"{"message": "Deleting branch.", "command": "git branch -D experimental", "isDangerous": false}"#;
        let intent = decode_intent(raw, &rules()).unwrap();

        assert!(intent.is_dangerous);
    }

    #[test]
    fn test_danger_flag_recomputed_downward() {
        // Model claims dangerous; a plain pull is not
        let raw = r#"{"message": "Pulling.", "command": "git pull", "isDangerous": true}"#;
        let intent = decode_intent(raw, &rules()).unwrap();

        assert!(!intent.is_dangerous);
    }

    #[test]
    fn test_literal_null_string_command() {
        let raw = r#"{"message": "Just an answer.", "command": "null", "isDangerous": false}"#;
        let intent = decode_intent(raw, &rules()).unwrap();

        assert!(intent.command.is_none());
    }
}
