pub mod rules;
pub mod validator;

pub use rules::{DangerRule, DangerRules, DangerousOp, RuleError};
pub use validator::{CommandValidator, ExecPolicy, ValidatedCommand, ValidationError};

/// Allowlist of permitted git subcommands
///
/// Used by both the CommandValidator (for command validation) and the
/// classifier boundary (for LLM output validation) to ensure consistency.
///
/// Adding a new subcommand requires careful security review.
pub const ALLOWED_GIT_SUBCOMMANDS: &[&str] = &[
    // Read operations
    "status",
    "log",
    "show",
    "diff",
    "branch",
    "tag",
    "remote",
    "reflog",
    "blame",
    "describe",
    // Write operations
    "init",
    "add",
    "commit",
    "checkout",
    "switch",
    "restore",
    "reset",
    "revert",
    "merge",
    "rebase",
    "cherry-pick",
    "stash",
    "clean",
    // Remote operations
    "push",
    "pull",
    "fetch",
    "clone",
    // Configuration (repo-level only)
    "config",
    // Dangerous operations (require confirmation)
    "filter-branch",
];

/// Utilities the permissive executor policy may run besides git
///
/// Read-only exploration plus the file-creation primitives the assistant is
/// taught to use. Everything else is rejected up front.
pub const SHELL_ALLOWLIST: &[&str] = &[
    "ls", "cat", "head", "tail", "find", "tree", "wc", "pwd", "cd", "file", "echo", "touch",
    "mkdir",
];
