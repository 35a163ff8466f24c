use std::fmt::Write;
use std::path::Path;

use crate::error::GitResult;
use crate::git::Repository;

const MAX_FILES_LISTED: usize = 50;

/// Builds the workspace summary embedded in classifier prompts
///
/// File paths are listed so the model can resolve fuzzy file references
/// ("add input.rs") to real workspace paths.
pub struct ContextBuilder {
    repo: Repository,
}

impl ContextBuilder {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Render the current repository state as prompt context
    pub fn build(&self, current_dir: &Path) -> GitResult<String> {
        let state = self.repo.state()?;
        let mut context = String::new();

        match &state.current_branch {
            Some(branch) => {
                let _ = writeln!(context, "Current branch: {}", branch);

                if let Some(upstream) = &state.upstream {
                    let _ = writeln!(
                        context,
                        "Upstream: {} (ahead: {}, behind: {})",
                        upstream.remote_branch, upstream.ahead, upstream.behind
                    );
                }
            }
            None => {
                let _ = writeln!(context, "Detached HEAD state");
            }
        }

        let _ = writeln!(context, "Current directory: {}", current_dir.display());

        if state.is_clean() {
            let _ = writeln!(context, "Working tree: clean");
        } else {
            let _ = writeln!(
                context,
                "Changes: {} staged, {} unstaged, {} untracked",
                state.staged_files.len(),
                state.unstaged_files.len(),
                state.untracked_files.len()
            );
        }

        let _ = writeln!(context, "\n=== Repository Files ===");

        for (label, files) in [
            ("Staged files:", &state.staged_files),
            ("Unstaged files:", &state.unstaged_files),
            ("Untracked files:", &state.untracked_files),
        ] {
            if !files.is_empty() {
                let _ = writeln!(context, "\n{}", label);
                for file in files.iter().take(MAX_FILES_LISTED) {
                    let _ = writeln!(context, "  {}", file.path);
                }
            }
        }

        if !state.recent_commits.is_empty() {
            let _ = writeln!(context, "\nRecent commits:");
            for commit in &state.recent_commits {
                let _ = writeln!(context, "  {}", commit.message);
            }
        }

        if state.in_merge {
            let _ = writeln!(context, "\nMerge in progress");
        }
        if state.in_rebase {
            let _ = writeln!(context, "\nRebase in progress");
        }

        Ok(context)
    }
}
