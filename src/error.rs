use std::io;
use thiserror::Error;

// Import module-level errors for AppError
use crate::chat::store::StoreError;
use crate::config::settings::ConfigError;
use crate::git::executor::ExecError;
use crate::llm::classifier::ClassifyError;
use crate::llm::client::LLMError;
use crate::security::validator::ValidationError;
use crate::workflow::commit::WorkflowError;

/// Errors that can occur while querying repository state
#[derive(Debug, Error)]
pub enum GitError {
    #[error("No workspace folder open")]
    NoWorkspace,

    #[error("Not a git repository")]
    NotARepository,

    #[error("Git command failed: {0}")]
    CommandFailed(String),

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.20")]
    GitVersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    GitVersionDetectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level application error that wraps all module-specific errors
///
/// This provides a unified error type for bridge-level code while preserving
/// the specific error context from each module. All module errors automatically
/// convert to AppError via the `From` trait.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Execution error: {0}")]
    Exec(#[from] ExecError),

    #[error("Security validation error: {0}")]
    Security(#[from] ValidationError),

    #[error("Commit workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for repository-state operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
