use regex::Regex;
use thiserror::Error;

/// Categories of destructive git operations that require confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DangerousOp {
    ForcePush,
    HardReset,
    ForceClean,
    DeleteBranch,
    ForceCheckout,
    HistoryRewrite,
}

impl DangerousOp {
    /// Short human-readable description used in confirmation prompts
    pub fn describe(&self) -> &'static str {
        match self {
            DangerousOp::ForcePush => "force-push (overwrites remote history)",
            DangerousOp::HardReset => "hard reset (discards local changes)",
            DangerousOp::ForceClean => "forced clean (deletes untracked files)",
            DangerousOp::DeleteBranch => "forced branch deletion",
            DangerousOp::ForceCheckout => "forced checkout (discards local changes)",
            DangerousOp::HistoryRewrite => "history rewrite",
        }
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid danger pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// A single destructive-command detection rule
#[derive(Debug)]
pub struct DangerRule {
    pattern: Regex,
    op: DangerousOp,
}

impl DangerRule {
    pub fn new(pattern: &str, op: DangerousOp) -> Result<Self, RuleError> {
        let pattern = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern, op })
    }

    pub fn op(&self) -> DangerousOp {
        self.op
    }
}

/// Ordered table of destructive-command rules
///
/// Kept as data rather than inline conditionals so the set can be tested in
/// isolation and extended from configuration. First match wins.
#[derive(Debug)]
pub struct DangerRules {
    rules: Vec<DangerRule>,
}

impl DangerRules {
    /// The built-in rule set: force-push, hard reset, forced clean, forced
    /// branch deletion, forced checkout, history rewrites.
    pub fn builtin() -> Self {
        let rules = [
            (r"(?i)push\b.*(\s--force(-with-lease)?\b|\s-f\b)", DangerousOp::ForcePush),
            (r"(?i)reset\b.*\s--hard\b", DangerousOp::HardReset),
            (r"(?i)clean\b.*(\s--force\b|\s-[a-z]*f)", DangerousOp::ForceClean),
            (r"branch\b.*(\s-[a-zA-Z]*D\b|\s--delete\s+--force\b)", DangerousOp::DeleteBranch),
            (r"(?i)checkout\b.*(\s--force\b|\s-f\b)", DangerousOp::ForceCheckout),
            (r"(?i)filter-branch\b", DangerousOp::HistoryRewrite),
        ];

        let rules = rules
            .iter()
            .map(|(pattern, op)| {
                // Built-in patterns are compile-time constants; a failure here
                // is a programming error, not a runtime condition.
                DangerRule::new(pattern, *op).unwrap_or_else(|e| panic!("{e}"))
            })
            .collect();

        Self { rules }
    }

    /// Build a rule table from externally supplied (pattern, op) pairs
    pub fn from_pairs(pairs: &[(String, DangerousOp)]) -> Result<Self, RuleError> {
        let rules = pairs
            .iter()
            .map(|(pattern, op)| DangerRule::new(pattern, *op))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Return the first matching destructive operation, if any
    pub fn match_op(&self, command: &str) -> Option<DangerousOp> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(command))
            .map(|rule| rule.op)
    }

    pub fn is_dangerous(&self, command: &str) -> bool {
        self.match_op(command).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for DangerRules {
    fn default() -> Self {
        Self::builtin()
    }
}
