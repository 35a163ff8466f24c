use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use gitpal::llm::client::{ChatModel, LLMError, LlmMessage};

/// Create a throwaway git repository with identity configured
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    // Canonicalize so sandbox prefix checks survive symlinked temp dirs
    let repo_path = temp_dir.path().canonicalize().unwrap();

    Command::new("git")
        .args(["init"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to init git repo");

    Command::new("git")
        .args(["config", "user.name", "Test User"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set git user.name");

    Command::new("git")
        .args(["config", "user.email", "test@example.com"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set git user.email");

    (temp_dir, repo_path)
}

/// Create a repository that has no usable author identity
///
/// An empty local user.name shadows any global identity, so commits fail
/// with an ident error no matter how the host machine is configured.
pub fn create_identityless_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().canonicalize().unwrap();

    Command::new("git")
        .args(["init"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to init git repo");

    Command::new("git")
        .args(["config", "user.useConfigOnly", "true"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set useConfigOnly");

    Command::new("git")
        .args(["config", "user.name", ""])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to blank user.name");

    Command::new("git")
        .args(["config", "user.email", "nobody@example.com"])
        .current_dir(&repo_path)
        .output()
        .expect("Failed to set user.email");

    (temp_dir, repo_path)
}

/// Write a file and stage it
pub fn stage_file(repo_path: &Path, file: &str, content: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");

    Command::new("git")
        .args(["add", file])
        .current_dir(repo_path)
        .output()
        .expect("Failed to add file");
}

/// Write, stage and commit a file
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    stage_file(repo_path, file, content);

    Command::new("git")
        .args(["commit", "-m", message])
        .current_dir(repo_path)
        .output()
        .expect("Failed to commit");
}

/// Subject of the most recent commit
pub fn last_commit_subject(repo_path: &Path) -> String {
    let output = Command::new("git")
        .args(["log", "--format=%s", "-1"])
        .current_dir(repo_path)
        .output()
        .expect("Failed to read log");

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// True when the repository has a local branch with this name
pub fn branch_exists(repo_path: &Path, branch: &str) -> bool {
    let output = Command::new("git")
        .args(["branch", "--list", branch])
        .current_dir(repo_path)
        .output()
        .expect("Failed to list branches");

    !String::from_utf8_lossy(&output.stdout).trim().is_empty()
}

/// One scripted model turn
pub enum MockReply {
    Text(String),
    Unavailable,
}

/// Shared view of the prompts a `MockModel` received
#[derive(Clone, Default)]
pub struct MockCallLog(Arc<Mutex<Vec<String>>>);

impl MockCallLog {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    fn record(&self, prompt: String) {
        self.0.lock().unwrap().push(prompt);
    }
}

/// Scripted stand-in for the LLM endpoint
pub struct MockModel {
    replies: Mutex<VecDeque<MockReply>>,
    model_name: Mutex<String>,
    log: MockCallLog,
}

impl MockModel {
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            model_name: Mutex::new("mock-model".to_string()),
            log: MockCallLog::default(),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::scripted(
            replies
                .iter()
                .map(|r| MockReply::Text(r.to_string()))
                .collect(),
        )
    }

    pub fn log(&self) -> MockCallLog {
        self.log.clone()
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn complete(&self, messages: &[LlmMessage]) -> Result<String, LLMError> {
        let last = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.log.record(last);

        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Unavailable) => Err(LLMError::Timeout),
            None => Err(LLMError::ApiError("mock replies exhausted".to_string())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn set_model(&mut self, model: &str) {
        *self.model_name.lock().unwrap() = model.to_string();
    }
}
