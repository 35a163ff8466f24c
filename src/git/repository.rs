use crate::error::{GitError, GitResult};
use crate::git::parser::{self, CommitEntry, StatusEntry};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Represents the workspace git repository and provides read access to its state
///
/// Queries here are fixed, fast, read-only commands issued by the assistant
/// itself; user-originated commands go through the `CommandExecutor` instead.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    /// Detect git repository from the given workspace root
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            let git_dir = current.join(".git");
            if git_dir.exists() {
                return Ok(Self::new(current));
            }

            // Move up to parent directory
            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Detect git repository from the current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = std::env::current_dir().map_err(GitError::IoError)?;
        Self::discover_from(&current_dir)
    }

    /// Create a Repository for a known git directory
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn query(&self, args: &[&str]) -> GitResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|e| GitError::CommandFailed(format!("Failed to execute git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Query the current repository state
    pub fn state(&self) -> GitResult<WorkspaceState> {
        let current_branch = self.current_branch()?;
        let upstream = self.upstream_info(&current_branch)?;
        let status_entries = self.status()?;
        let commits = self.recent_commits(5)?;

        let mut staged = Vec::new();
        let mut unstaged = Vec::new();
        let mut untracked = Vec::new();

        for entry in status_entries {
            if entry.staged {
                staged.push(entry.clone());
            }
            if entry.unstaged {
                unstaged.push(entry.clone());
            }
            if entry.status == parser::FileStatus::Untracked {
                untracked.push(entry);
            }
        }

        let in_merge = self.path.join(".git/MERGE_HEAD").exists();
        let in_rebase = self.path.join(".git/rebase-merge").exists()
            || self.path.join(".git/rebase-apply").exists();

        Ok(WorkspaceState {
            current_branch,
            upstream,
            staged_files: staged,
            unstaged_files: unstaged,
            untracked_files: untracked,
            recent_commits: commits,
            in_merge,
            in_rebase,
        })
    }

    /// Get the current branch name (None in detached HEAD state)
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        match self.query(&["branch", "--show-current"]) {
            Ok(output) => {
                let branch = output.trim();
                if branch.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(branch.to_string()))
                }
            }
            Err(_) => Ok(None),
        }
    }

    /// Get upstream tracking info for the current branch
    fn upstream_info(&self, branch: &Option<String>) -> GitResult<Option<UpstreamInfo>> {
        let branch_name = match branch {
            Some(b) => b,
            None => return Ok(None),
        };

        let format = "--format=%(upstream:short)";
        let refname = format!("refs/heads/{}", branch_name);
        let upstream_branch = match self.query(&["for-each-ref", format, &refname]) {
            Ok(output) => {
                let upstream = output.trim();
                if upstream.is_empty() {
                    return Ok(None);
                }
                upstream.to_string()
            }
            Err(_) => return Ok(None),
        };

        let range = format!("{}...{}", branch_name, upstream_branch);
        match self.query(&["rev-list", "--left-right", "--count", &range]) {
            Ok(output) => {
                let parts: Vec<&str> = output.split_whitespace().collect();
                if parts.len() == 2 {
                    let ahead = parts[0].parse::<usize>().unwrap_or(0);
                    let behind = parts[1].parse::<usize>().unwrap_or(0);

                    Ok(Some(UpstreamInfo {
                        remote_branch: upstream_branch,
                        ahead,
                        behind,
                    }))
                } else {
                    Ok(None)
                }
            }
            Err(_) => Ok(None),
        }
    }

    /// Get status entries
    pub fn status(&self) -> GitResult<Vec<StatusEntry>> {
        let output = self.query(&["status", "--porcelain=v2"])?;
        parser::parse_status_porcelain_v2(&output)
    }

    /// True when the staged set is non-empty
    pub fn has_staged_changes(&self) -> GitResult<bool> {
        let output = Command::new("git")
            .args(["diff", "--cached", "--quiet"])
            .current_dir(&self.path)
            .output()
            .map_err(|e| GitError::CommandFailed(format!("Failed to execute git: {}", e)))?;

        // Exit 0 = no staged changes, 1 = staged changes present
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(GitError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }

    /// The full staged diff, as fed to the commit-message generator
    pub fn staged_diff(&self) -> GitResult<String> {
        self.query(&["diff", "--staged"])
    }

    /// Get recent commits
    pub fn recent_commits(&self, count: usize) -> GitResult<Vec<CommitEntry>> {
        let count_arg = format!("-n{}", count);
        match self.query(&["log", &count_arg, "--format=%H%x00%s"]) {
            Ok(output) => parser::parse_log(&output),
            Err(_) => Ok(Vec::new()), // Empty repo has no commits
        }
    }
}

/// Upstream tracking information
#[derive(Debug, Clone)]
pub struct UpstreamInfo {
    pub remote_branch: String,
    pub ahead: usize,
    pub behind: usize,
}

/// Snapshot of the workspace repository state
#[derive(Debug, Clone)]
pub struct WorkspaceState {
    pub current_branch: Option<String>,
    pub upstream: Option<UpstreamInfo>,
    pub staged_files: Vec<StatusEntry>,
    pub unstaged_files: Vec<StatusEntry>,
    pub untracked_files: Vec<StatusEntry>,
    pub recent_commits: Vec<CommitEntry>,
    pub in_merge: bool,
    pub in_rebase: bool,
}

impl WorkspaceState {
    /// Check if the repository is in a clean state (no changes)
    pub fn is_clean(&self) -> bool {
        self.staged_files.is_empty()
            && self.unstaged_files.is_empty()
            && self.untracked_files.is_empty()
    }

    /// Check if in detached HEAD state
    pub fn is_detached(&self) -> bool {
        self.current_branch.is_none()
    }
}
