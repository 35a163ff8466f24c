use thiserror::Error;

use crate::error::GitError;
use crate::git::Repository;
use crate::git::executor::{CommandExecutor, ExecError};
use crate::llm::client::{ChatModel, LLMError, LlmMessage};
use crate::llm::prompts;

/// Hard cap on the cleaned commit subject
const SUBJECT_MAX_CHARS: usize = 50;

/// Shortest manual override accepted before falling back to the suggestion
const MIN_OVERRIDE_CHARS: usize = 2;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    #[error("No commit suggestion is pending")]
    NoPendingSuggestion,
}

/// Where the commit workflow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitState {
    #[default]
    Idle,
    SuggestionPending,
    AwaitingUserDecision,
}

/// Observable outcome of a workflow step, rendered by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum CommitEvent {
    /// Staged set was empty; nothing happened
    NothingToCommit,
    /// A suggestion is waiting for confirmation or an override
    Suggested { message: String },
    /// Commit landed; push/undo are sensible follow-ups
    Committed { message: String, output: String },
    /// Commit failed because git has no author identity configured
    IdentityUnknown { detail: String },
}

/// Drives the suggest → confirm/override → commit flow
///
/// The suggestion lives here as transient state; it is cleared on commit, on
/// reset (new chat), and on every fallback resolution.
#[derive(Debug, Default)]
pub struct CommitWorkflow {
    state: CommitState,
    pending: Option<String>,
}

impl CommitWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CommitState {
        self.state
    }

    pub fn pending_suggestion(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// True when the next free-text input should be read as a commit-message
    /// override rather than a new request.
    pub fn is_awaiting_decision(&self) -> bool {
        self.state == CommitState::AwaitingUserDecision
    }

    /// Unconditional return to Idle; clears any pending suggestion
    pub fn reset(&mut self) {
        self.state = CommitState::Idle;
        self.pending = None;
    }

    /// Start the workflow: require staged changes, then ask the model to
    /// summarize the staged diff into a commit subject.
    pub async fn start(
        &mut self,
        repo: &Repository,
        model: &dyn ChatModel,
    ) -> Result<CommitEvent, WorkflowError> {
        self.reset();

        if !repo.has_staged_changes()? {
            return Ok(CommitEvent::NothingToCommit);
        }

        self.state = CommitState::SuggestionPending;

        let diff = repo.staged_diff()?;
        let prompt = prompts::commit_message_prompt(&diff);

        let raw = match model.complete(&[LlmMessage::user(prompt)]).await {
            Ok(raw) => raw,
            Err(e) => {
                self.reset();
                return Err(e.into());
            }
        };

        let suggestion = clean_subject(&raw);
        self.pending = Some(suggestion.clone());
        self.state = CommitState::AwaitingUserDecision;

        Ok(CommitEvent::Suggested {
            message: suggestion,
        })
    }

    /// User accepted the suggestion; commit it verbatim
    pub async fn confirm(
        &mut self,
        executor: &CommandExecutor,
    ) -> Result<CommitEvent, WorkflowError> {
        let message = self.pending.clone().ok_or(WorkflowError::NoPendingSuggestion)?;
        self.commit(executor, message).await
    }

    /// User typed a replacement message instead of confirming
    ///
    /// Overrides shorter than two characters fall back to the suggestion.
    /// Otherwise a validation pass either sanitizes the text or rejects it
    /// with the literal `INVALID` (falling back to the suggestion again). A
    /// validator transport failure commits the raw trimmed input.
    pub async fn override_message(
        &mut self,
        executor: &CommandExecutor,
        model: &dyn ChatModel,
        user_text: &str,
    ) -> Result<CommitEvent, WorkflowError> {
        let suggestion = self.pending.clone().ok_or(WorkflowError::NoPendingSuggestion)?;

        let trimmed = user_text.trim();
        let message = if trimmed.chars().count() < MIN_OVERRIDE_CHARS {
            tracing::debug!("override too short, using suggestion");
            suggestion
        } else {
            let prompt = prompts::validate_commit_prompt(trimmed);
            match model.complete(&[LlmMessage::user(prompt)]).await {
                Ok(verdict) if verdict.trim() == "INVALID" => {
                    tracing::debug!("override rejected by validator, using suggestion");
                    suggestion
                }
                Ok(verdict) => clean_subject(&verdict),
                Err(e) => {
                    tracing::warn!(error = %e, "commit-message validator unavailable");
                    trimmed.to_string()
                }
            }
        };

        self.commit(executor, message).await
    }

    async fn commit(
        &mut self,
        executor: &CommandExecutor,
        message: String,
    ) -> Result<CommitEvent, WorkflowError> {
        let result = executor.run_git(&["commit", "-m", &message]).await;
        self.reset();

        match result {
            Ok(output) => Ok(CommitEvent::Committed {
                message,
                output: output.display_text(),
            }),
            Err(ExecError::Failed(detail)) if is_identity_error(&detail) => {
                Ok(CommitEvent::IdentityUnknown { detail })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Reduce a model reply to a single clean commit subject: first line, no
/// quotes or backticks, no trailing period, at most 50 characters.
pub fn clean_subject(raw: &str) -> String {
    let mut text = raw.trim();

    if text.starts_with("```") {
        if let Some(first_newline) = text.find('\n') {
            text = &text[first_newline + 1..];
        }
        if let Some(last_fence) = text.rfind("```") {
            text = &text[..last_fence];
        }
    }

    let first_line = text.lines().next().unwrap_or_default();
    let cleaned: String = first_line
        .chars()
        .filter(|c| *c != '"' && *c != '`')
        .collect();

    let mut subject = cleaned.trim().trim_matches('\'').trim().to_string();
    while subject.ends_with('.') {
        subject.pop();
    }

    if subject.chars().count() > SUBJECT_MAX_CHARS {
        subject = subject.chars().take(SUBJECT_MAX_CHARS).collect();
        subject = subject.trim_end().to_string();
    }

    subject
}

fn is_identity_error(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    lower.contains("identity unknown")
        || lower.contains("please tell me who you are")
        || lower.contains("empty ident name")
        || (lower.contains("user.name") && lower.contains("user.email"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_subject_plain() {
        assert_eq!(clean_subject("Add greet function"), "Add greet function");
    }

    #[test]
    fn test_clean_subject_strips_quotes() {
        assert_eq!(
            clean_subject("\"Add greet function to log output\""),
            "Add greet function to log output"
        );
    }

    #[test]
    fn test_clean_subject_strips_fences_and_extra_lines() {
        let raw = "```\nAdd greet function\n\nThis adds a new function.\n```";
        assert_eq!(clean_subject(raw), "Add greet function");
    }

    #[test]
    fn test_clean_subject_trailing_period() {
        assert_eq!(clean_subject("Fix typo in README."), "Fix typo in README");
    }

    #[test]
    fn test_clean_subject_truncates_to_fifty_chars() {
        let long = "Add an extremely detailed description of the new greeting function behavior";
        let subject = clean_subject(long);

        assert!(subject.chars().count() <= 50);
        assert!(long.starts_with(&subject));
    }

    #[test]
    fn test_identity_error_detection() {
        assert!(is_identity_error(
            "fatal: unable to auto-detect email address\n*** Please tell me who you are."
        ));
        assert!(is_identity_error("Committer identity unknown"));
        assert!(is_identity_error(
            "fatal: user.name and user.email need to be set"
        ));
        assert!(is_identity_error(
            "fatal: empty ident name (for <nobody@example.com>) not allowed"
        ));
        assert!(!is_identity_error("fatal: nothing to commit"));
    }

    #[test]
    fn test_initial_state_is_idle() {
        let workflow = CommitWorkflow::new();
        assert_eq!(workflow.state(), CommitState::Idle);
        assert!(workflow.pending_suggestion().is_none());
        assert!(!workflow.is_awaiting_decision());
    }

    #[test]
    fn test_reset_clears_pending() {
        let mut workflow = CommitWorkflow {
            state: CommitState::AwaitingUserDecision,
            pending: Some("Add feature".to_string()),
        };

        workflow.reset();

        assert_eq!(workflow.state(), CommitState::Idle);
        assert!(workflow.pending_suggestion().is_none());
    }
}
