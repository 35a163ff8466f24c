use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only audit trail of executed commands and rejected model output
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a logger at the default path: ~/.config/gitpal/audit.log
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create a logger with a custom log path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set",
            )
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gitpal")
            .join("audit.log"))
    }

    /// Record a command execution and its exit code
    pub fn log_command(
        &self,
        command: &str,
        workspace: &Path,
        exit_code: i32,
    ) -> std::io::Result<()> {
        self.append(&format!(
            "[{}] [exit:{}] {}",
            workspace.display(),
            exit_code,
            command
        ))
    }

    /// Record model output or user input that failed validation
    ///
    /// Helps spot attack patterns and model misbehavior after the fact.
    pub fn log_rejected(
        &self,
        query: &str,
        output: &str,
        reason: &str,
        workspace: &Path,
    ) -> std::io::Result<()> {
        self.append(&format!(
            "[{}] [REJECTED] query=\"{}\" output=\"{}\" reason=\"{}\"",
            workspace.display(),
            query,
            output,
            reason
        ))
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let line = format!("[{}] {}\n", timestamp, entry);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(line.as_bytes())?;
        file.flush()
    }

    /// Rotate audit.log -> audit.log.1 once it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_command() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");

        let logger = AuditLogger::with_path(&log_path).unwrap();
        logger
            .log_command("git status", Path::new("/test/repo"), 0)
            .unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("git status"));
        assert!(content.contains("/test/repo"));
        assert!(content.contains("exit:0"));
    }

    #[test]
    fn test_multiple_entries_are_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");
        let logger = AuditLogger::with_path(&log_path).unwrap();
        let repo = Path::new("/test/repo");

        logger.log_command("git status", repo, 0).unwrap();
        logger.log_command("git add .", repo, 0).unwrap();
        logger.log_command("git commit -m test", repo, 1).unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("exit:1"));
    }

    #[test]
    fn test_log_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");
        let logger = AuditLogger::with_path(&log_path).unwrap();

        logger
            .log_rejected(
                "check status",
                "git status; rm -rf /",
                "shell metacharacter ';'",
                Path::new("/test/repo"),
            )
            .unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("REJECTED"));
        assert!(content.contains("rm -rf /"));
        assert!(content.contains("metacharacter"));
    }

    #[test]
    fn test_log_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("test.log");
        let logger = AuditLogger::with_path(&log_path).unwrap();
        let repo = Path::new("/test/repo");

        let large_command = "git ".to_string() + &"x".repeat(MAX_LOG_SIZE as usize);
        logger.log_command(&large_command, repo, 0).unwrap();
        logger.log_command("git status", repo, 0).unwrap();

        let backup_path = log_path.with_extension("log.1");
        assert!(backup_path.exists());
        assert!(log_path.exists());
        assert!(fs::metadata(&log_path).unwrap().len() < MAX_LOG_SIZE);
    }
}
