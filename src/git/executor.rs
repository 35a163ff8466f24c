use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use crate::security::rules::DangerousOp;
use crate::security::validator::{
    CommandValidator, ExecPolicy, ValidatedCommand, ValidationError,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("No workspace folder open")]
    NoWorkspace,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Access denied: cannot access paths outside the workspace: {0}")]
    PathEscape(String),

    #[error("Destructive command requires confirmation")]
    ConfirmationRequired(DangerousOp),

    #[error("Command cancelled by user")]
    Cancelled,

    #[error("Command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Command output exceeded {0} bytes")]
    OutputTooLarge(usize),

    #[error("Command failed: {0}")]
    Failed(String),

    #[error("No such directory: {0}")]
    NoSuchDirectory(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of running a command
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl ExecOutput {
    /// Text worth showing in the chat panel: stdout, else stderr (git reports
    /// progress there even on success), else a completion note.
    pub fn display_text(&self) -> String {
        if !self.stdout.trim().is_empty() {
            self.stdout.clone()
        } else if !self.stderr.trim().is_empty() {
            self.stderr.clone()
        } else {
            "Command completed (no output).".to_string()
        }
    }

    fn synthetic(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: 0,
            success: true,
        }
    }
}

/// Runs validated commands inside the workspace root
///
/// `cd` and `pwd` never spawn a process: the executor tracks a relative
/// subdirectory and answers from that state. Everything else runs as a
/// subprocess with the tracked directory as its working directory, bounded
/// by a timeout and an output cap.
pub struct CommandExecutor {
    workspace_root: PathBuf,
    subdir: PathBuf,
    validator: CommandValidator,
    timeout: Duration,
    max_output_bytes: usize,
}

impl CommandExecutor {
    pub fn new<P: AsRef<Path>>(workspace_root: P, policy: ExecPolicy) -> Self {
        Self {
            workspace_root: workspace_root.as_ref().to_path_buf(),
            subdir: PathBuf::new(),
            validator: CommandValidator::new(policy),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_limits<P: AsRef<Path>>(
        workspace_root: P,
        validator: CommandValidator,
        timeout: Duration,
        max_output_bytes: usize,
    ) -> Self {
        Self {
            workspace_root: workspace_root.as_ref().to_path_buf(),
            subdir: PathBuf::new(),
            validator,
            timeout,
            max_output_bytes,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Workspace-relative tracked subdirectory (empty at the root)
    pub fn current_subdir(&self) -> &Path {
        &self.subdir
    }

    /// Absolute tracked working directory
    pub fn current_dir(&self) -> PathBuf {
        self.workspace_root.join(&self.subdir)
    }

    /// Validate a command without running it
    pub fn validate(&self, command: &str) -> Result<ValidatedCommand, ExecError> {
        Ok(self.validator.validate(command)?)
    }

    /// Validate and run a command, refusing destructive ones
    ///
    /// Destructive matches return `ConfirmationRequired`; the caller owns the
    /// confirmation dialogue and re-issues the command through
    /// [`run_validated`](Self::run_validated) once the user agrees.
    pub async fn execute(&mut self, command: &str) -> Result<ExecOutput, ExecError> {
        let validated = self.validate(command)?;

        if let Some(op) = validated.danger {
            return Err(ExecError::ConfirmationRequired(op));
        }

        self.run_validated(&validated).await
    }

    /// Run an already-validated command; the danger gate is the caller's
    pub async fn run_validated(
        &mut self,
        validated: &ValidatedCommand,
    ) -> Result<ExecOutput, ExecError> {
        let mut args = split_args(&validated.command)?;

        match validated.program.as_str() {
            "cd" => {
                let target = args.get(1).cloned().unwrap_or_default();
                return self.handle_cd(&target);
            }
            "pwd" => {
                return Ok(ExecOutput::synthetic(
                    self.current_dir().display().to_string(),
                ));
            }
            _ => {}
        }

        // A single trailing `> file` redirect is emulated for the permissive
        // file-creation commands; no shell is ever involved.
        let redirect = self.extract_redirect(&mut args)?;

        if validated.program != "git" {
            self.check_path_args(&args)?;
        }

        let program = args.remove(0);
        let output = self.spawn_bounded(&program, &args).await?;

        if let Some(target) = redirect {
            std::fs::write(&target, output.stdout.as_bytes())?;
            return Ok(ExecOutput::synthetic(format!(
                "Wrote {} bytes to {}",
                output.stdout.len(),
                target.display()
            )));
        }

        Ok(output)
    }

    /// Run git with an explicit argument vector
    ///
    /// Used by the commit workflow where arguments (the commit message) must
    /// not round-trip through string tokenization.
    pub async fn run_git(&self, args: &[&str]) -> Result<ExecOutput, ExecError> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.spawn_bounded("git", &args).await
    }

    async fn spawn_bounded(&self, program: &str, args: &[String]) -> Result<ExecOutput, ExecError> {
        if !self.workspace_root.is_dir() {
            return Err(ExecError::NoWorkspace);
        }

        let cwd = self.current_dir();

        let future = Command::new(program)
            .args(args)
            .current_dir(&cwd)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, future)
            .await
            .map_err(|_| ExecError::Timeout(self.timeout))??;

        if output.stdout.len() + output.stderr.len() > self.max_output_bytes {
            return Err(ExecError::OutputTooLarge(self.max_output_bytes));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();

        if !success {
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(ExecError::Failed(detail));
        }

        Ok(ExecOutput {
            stdout,
            stderr,
            exit_code,
            success,
        })
    }

    /// `cd` is a pure state mutation on the tracked subdirectory
    fn handle_cd(&mut self, target: &str) -> Result<ExecOutput, ExecError> {
        if target.is_empty() || target == "~" || target == "/" {
            self.subdir = PathBuf::new();
            return Ok(ExecOutput::synthetic(format!(
                "Changed to workspace root: {}",
                self.workspace_root.display()
            )));
        }

        let candidate = normalize_path(&self.current_dir().join(target));
        if !candidate.starts_with(&self.workspace_root) {
            return Err(ExecError::PathEscape(target.to_string()));
        }
        if !candidate.is_dir() {
            return Err(ExecError::NoSuchDirectory(target.to_string()));
        }

        self.subdir = candidate
            .strip_prefix(&self.workspace_root)
            .unwrap_or(Path::new(""))
            .to_path_buf();

        Ok(ExecOutput::synthetic(format!(
            "Changed to: {}",
            candidate.display()
        )))
    }

    /// Every non-flag argument must resolve inside the workspace root
    fn check_path_args(&self, args: &[String]) -> Result<(), ExecError> {
        let cwd = self.current_dir();

        for arg in args.iter().skip(1) {
            if arg.starts_with('-') {
                continue;
            }

            let resolved = if Path::new(arg).is_absolute() {
                normalize_path(Path::new(arg))
            } else {
                normalize_path(&cwd.join(arg))
            };

            if !resolved.starts_with(&self.workspace_root) {
                return Err(ExecError::PathEscape(arg.clone()));
            }
        }

        Ok(())
    }

    /// Pull a trailing `> target` out of the argument list, if present
    fn extract_redirect(&self, args: &mut Vec<String>) -> Result<Option<PathBuf>, ExecError> {
        let Some(pos) = args.iter().position(|a| a == ">") else {
            return Ok(None);
        };

        if self.validator.policy() != ExecPolicy::Permissive {
            return Err(ExecError::Validation(ValidationError::SuspiciousOperators(
                ">".to_string(),
            )));
        }

        if pos + 2 != args.len() {
            return Err(ExecError::Validation(ValidationError::InvalidFormat));
        }

        let target = args.pop().unwrap_or_default();
        args.pop(); // the ">" itself

        let resolved = normalize_path(&self.current_dir().join(&target));
        if !resolved.starts_with(&self.workspace_root) {
            return Err(ExecError::PathEscape(target));
        }

        Ok(Some(resolved))
    }
}

/// Quote-aware argument splitting
///
/// Supports double and single quotes and backslash escapes outside single
/// quotes, so `git commit -m "two words"` survives without a shell.
pub fn split_args(command: &str) -> Result<Vec<String>, ExecError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            Some(_) => match c {
                '"' => quote = None,
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                _ => current.push(c),
            },
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        in_token = true;
                    }
                }
                c if c.is_whitespace() => {
                    if in_token {
                        args.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                _ => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err(ExecError::Validation(ValidationError::InvalidFormat));
    }
    if in_token {
        args.push(current);
    }
    if args.is_empty() {
        return Err(ExecError::Validation(ValidationError::EmptyCommand));
    }

    Ok(args)
}

/// Lexically normalize a path (resolve `.` and `..` without touching the
/// filesystem, so not-yet-created targets can still be checked)
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }

    out
}
