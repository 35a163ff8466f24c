use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::chat::session::ChatSession;

pub const DEFAULT_SESSION_CAP: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read session store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode session store: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store directory not found")]
    DirectoryNotFound,
}

/// Persistence contract for chat sessions
///
/// The whole ordered list is read on load and rewritten on every session
/// mutation; implementations only move bytes.
pub trait SessionStore: Send {
    fn load_all(&self) -> Result<Vec<ChatSession>, StoreError>;
    fn save_all(&mut self, sessions: &[ChatSession]) -> Result<(), StoreError>;
}

/// JSON-file session store under the user config directory
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Default store location: ~/.config/gitpal/sessions.json
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = std::env::var("HOME").map_err(|_| StoreError::DirectoryNotFound)?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitpal")
            .join("sessions.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<ChatSession>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_all(&mut self, sessions: &[ChatSession]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(sessions)?;
        fs::write(&self.path, contents)?;

        // Sessions can contain anything the user typed
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    sessions: Vec<ChatSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<ChatSession>, StoreError> {
        Ok(self.sessions.clone())
    }

    fn save_all(&mut self, sessions: &[ChatSession]) -> Result<(), StoreError> {
        self.sessions = sessions.to_vec();
        Ok(())
    }
}

/// Insert or replace a session in the most-recent-first list, evicting the
/// oldest entries beyond `cap`.
pub fn upsert(sessions: &mut Vec<ChatSession>, session: ChatSession, cap: usize) {
    sessions.retain(|s| s.id != session.id);
    sessions.insert(0, session);
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sessions.truncate(cap);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{ChatMessage, Sender};
    use tempfile::TempDir;

    fn session_with_message(text: &str) -> ChatSession {
        let mut session = ChatSession::new();
        session.push(ChatMessage::new(Sender::User, text));
        session
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp.path().join("sessions.json"));

        let sessions = vec![session_with_message("hello there")];
        store.save_all(&sessions).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, sessions[0].id);
        assert_eq!(loaded[0].messages[0].text, "hello there");
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().join("nope.json"));

        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp.path().join("deep/nested/sessions.json"));

        store.save_all(&[session_with_message("hi")]).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut sessions = Vec::new();
        let mut session = session_with_message("original");
        upsert(&mut sessions, session.clone(), 10);

        session.push(ChatMessage::new(Sender::Agent, "reply"));
        upsert(&mut sessions, session, 10);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].messages.len(), 2);
    }

    #[test]
    fn test_upsert_evicts_oldest_beyond_cap() {
        let mut sessions = Vec::new();

        for i in 0..5 {
            upsert(&mut sessions, session_with_message(&format!("chat {i}")), 3);
        }

        assert_eq!(sessions.len(), 3);
        // Most recent first; "chat 0" and "chat 1" were evicted
        assert_eq!(sessions[0].messages[0].text, "chat 4");
        assert_eq!(sessions[2].messages[0].text, "chat 2");
    }
}
