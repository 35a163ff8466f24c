/// A git failure rephrased for beginners, with the raw text preserved
#[derive(Debug, Clone)]
pub struct UserFriendlyError {
    pub simple_message: String,
    pub suggestion: Option<String>,
    pub raw_error: String,
}

impl UserFriendlyError {
    /// Render as a single chat-panel message
    pub fn to_chat_text(&self) -> String {
        let mut text = self.simple_message.clone();

        if let Some(suggestion) = &self.suggestion {
            text.push('\n');
            text.push_str(suggestion);
        }

        if !self.raw_error.trim().is_empty() && self.raw_error != self.simple_message {
            text.push_str("\n\n");
            text.push_str(self.raw_error.trim());
        }

        text
    }
}

/// Match common git failure texts and explain them
pub fn translate_git_failure(raw_error: &str) -> UserFriendlyError {
    let (simple_message, suggestion) = match_error_patterns(raw_error);

    UserFriendlyError {
        simple_message,
        suggestion,
        raw_error: raw_error.to_string(),
    }
}

fn match_error_patterns(error_text: &str) -> (String, Option<String>) {
    let lower = error_text.to_lowercase();

    // Missing author identity gets its own actionable message
    if lower.contains("identity unknown")
        || lower.contains("please tell me who you are")
        || lower.contains("empty ident name")
        || (lower.contains("user.name") && lower.contains("user.email"))
    {
        return (
            "Git doesn't know who you are yet.".to_string(),
            Some(
                "Set your identity first:\n  git config user.name \"Your Name\"\n  git config user.email \"you@example.com\""
                    .to_string(),
            ),
        );
    }

    if lower.contains("no upstream") || lower.contains("does not have an upstream") {
        return (
            "No remote branch is configured for tracking.".to_string(),
            Some("Try: git push -u origin <branch-name>".to_string()),
        );
    }

    if lower.contains("merge conflict") || lower.contains("conflict") {
        return (
            "Merge has conflicts that need to be resolved.".to_string(),
            Some("Fix conflicts in the listed files, then git add and git commit.".to_string()),
        );
    }

    if lower.contains("nothing to commit") || lower.contains("working tree clean") {
        return (
            "No changes to commit - working directory is clean.".to_string(),
            None,
        );
    }

    if lower.contains("pathspec") && lower.contains("did not match") {
        return (
            "File path not found in the repository.".to_string(),
            Some("Check the file path and try again. Use 'git status' to see available files.".to_string()),
        );
    }

    if lower.contains("already exists") && (lower.contains("branch") || lower.contains("ref")) {
        return (
            "A branch with that name already exists.".to_string(),
            Some("Use a different name or delete the existing branch first.".to_string()),
        );
    }

    if lower.contains("not a git repository") {
        return (
            "Current directory is not a git repository.".to_string(),
            Some("Initialize one with: git init".to_string()),
        );
    }

    if lower.contains("authentication failed") || lower.contains("could not read username") {
        return (
            "Authentication with the remote failed.".to_string(),
            Some("Check your credentials or SSH key setup.".to_string()),
        );
    }

    // Everything else surfaces raw
    (error_text.trim().to_string(), None)
}
