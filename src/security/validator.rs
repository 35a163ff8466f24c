use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::security::rules::{DangerRules, DangerousOp};
use crate::security::{ALLOWED_GIT_SUBCOMMANDS, SHELL_ALLOWLIST};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Command not allowed: {0}")]
    NotAllowed(String),

    #[error("Git subcommand not allowed: {0}")]
    DisallowedSubcommand(String),

    #[error("Command contains suspicious operators: {0}")]
    SuspiciousOperators(String),

    #[error("Command contains dangerous flags: {0}")]
    DangerousFlags(String),

    #[error("Invalid command format")]
    InvalidFormat,

    #[error("Empty command")]
    EmptyCommand,
}

/// Which commands the executor is willing to run
///
/// The prototypes disagreed on this; both variants are carried and the
/// choice is an explicit configuration decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecPolicy {
    /// Only commands literally starting with `git `
    #[default]
    GitOnly,
    /// Git plus a fixed set of read-only/navigation/file-creation utilities
    Permissive,
}

#[derive(Debug, Clone)]
pub struct ValidatedCommand {
    pub command: String,
    /// Leading token (`git`, `ls`, ...)
    pub program: String,
    pub is_dangerous: bool,
    pub danger: Option<DangerousOp>,
}

pub struct CommandValidator {
    policy: ExecPolicy,
    rules: DangerRules,
}

impl CommandValidator {
    pub fn new(policy: ExecPolicy) -> Self {
        Self {
            policy,
            rules: DangerRules::builtin(),
        }
    }

    pub fn with_rules(policy: ExecPolicy, rules: DangerRules) -> Self {
        Self { policy, rules }
    }

    pub fn policy(&self) -> ExecPolicy {
        self.policy
    }

    pub fn rules(&self) -> &DangerRules {
        &self.rules
    }

    /// Validate a command against the injection checks, the active policy's
    /// allow-list, and the destructive-pattern table.
    ///
    /// A dangerous match is returned, not rejected; the execution layer owns
    /// the confirmation gate.
    pub fn validate(&self, command: &str) -> Result<ValidatedCommand, ValidationError> {
        let command = command.trim();

        if command.is_empty() {
            return Err(ValidationError::EmptyCommand);
        }

        self.check_for_injection(command)?;

        let program = command
            .split_whitespace()
            .next()
            .ok_or(ValidationError::InvalidFormat)?
            .to_string();

        if program == "git" {
            // Flags like -c/-C can smuggle arbitrary config or directories
            self.check_dangerous_flags(command)?;

            let subcommand = Self::extract_subcommand(command)?;
            if !ALLOWED_GIT_SUBCOMMANDS.contains(&subcommand) {
                return Err(ValidationError::DisallowedSubcommand(subcommand.to_string()));
            }
        } else {
            match self.policy {
                ExecPolicy::GitOnly => {
                    return Err(ValidationError::NotAllowed(program));
                }
                ExecPolicy::Permissive => {
                    if !SHELL_ALLOWLIST.contains(&program.as_str()) {
                        return Err(ValidationError::NotAllowed(program));
                    }
                }
            }
        }

        let danger = if program == "git" {
            self.rules.match_op(command)
        } else {
            None
        };

        Ok(ValidatedCommand {
            command: command.to_string(),
            program,
            is_dangerous: danger.is_some(),
            danger,
        })
    }

    /// Extract the git subcommand, skipping leading flags
    fn extract_subcommand(command: &str) -> Result<&str, ValidationError> {
        let cmd = command.strip_prefix("git ").unwrap_or(command);

        for word in cmd.split_whitespace() {
            if !word.starts_with('-') {
                return Ok(word);
            }
        }

        Err(ValidationError::InvalidFormat)
    }

    /// Reject shell metacharacters; commands never pass through a shell, so
    /// anything relying on one is either an injection attempt or would
    /// silently misbehave.
    fn check_for_injection(&self, command: &str) -> Result<(), ValidationError> {
        let suspicious = [";", "&&", "||", "|", "<", "$(", "`"];

        for op in &suspicious {
            if command.contains(op) {
                return Err(ValidationError::SuspiciousOperators(op.to_string()));
            }
        }

        // A single trailing `> file` redirect is implemented by the executor
        // itself in permissive mode; everywhere else `>` is rejected.
        if command.contains('>') && self.policy != ExecPolicy::Permissive {
            return Err(ValidationError::SuspiciousOperators(">".to_string()));
        }

        Ok(())
    }

    fn check_dangerous_flags(&self, command: &str) -> Result<(), ValidationError> {
        // -c sets arbitrary git config (e.g. core.pager) before the subcommand
        if command.contains(" -c ") || command.starts_with("-c ") {
            return Err(ValidationError::DangerousFlags("-c".to_string()));
        }

        // -C runs git in an arbitrary directory, escaping the workspace
        if command.contains(" -C ") || command.starts_with("-C ") {
            return Err(ValidationError::DangerousFlags("-C".to_string()));
        }

        for flag in ["--exec", "core.sshCommand"] {
            if command.contains(flag) {
                return Err(ValidationError::DangerousFlags(flag.to_string()));
            }
        }

        Ok(())
    }
}

impl Default for CommandValidator {
    fn default() -> Self {
        Self::new(ExecPolicy::default())
    }
}
