use crate::error::{GitError, GitResult};
use std::process::Command;

/// Minimum git version the assistant relies on (porcelain=v2, switch/restore)
const MIN_GIT_VERSION: (u32, u32) = (2, 20);

/// Installed git version, detected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Detect the installed git version
    pub fn detect() -> GitResult<Self> {
        let output = Command::new("git")
            .arg("--version")
            .output()
            .map_err(|e| {
                GitError::GitVersionDetectionFailed(format!("Failed to execute git: {}", e))
            })?;

        if !output.status.success() {
            return Err(GitError::GitVersionDetectionFailed(
                "git --version command failed".to_string(),
            ));
        }

        Self::parse(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parse output like "git version 2.39.2" (suffixes such as
    /// ".windows.1" are tolerated)
    pub fn parse(version_str: &str) -> GitResult<Self> {
        let mut words = version_str.split_whitespace();

        if words.next() != Some("git") || words.next() != Some("version") {
            return Err(GitError::ParseError(format!(
                "Unexpected git version format: {}",
                version_str
            )));
        }

        let nums = words.next().ok_or_else(|| {
            GitError::ParseError(format!("Missing version number: {}", version_str))
        })?;

        let mut parts = nums.split('.');
        let major = Self::parse_component(parts.next(), nums)?;
        let minor = Self::parse_component(parts.next(), nums)?;
        let patch = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(0);

        Ok(GitVersion {
            major,
            minor,
            patch,
        })
    }

    fn parse_component(part: Option<&str>, full: &str) -> GitResult<u32> {
        part.and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| GitError::ParseError(format!("Invalid version number: {}", full)))
    }

    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) >= MIN_GIT_VERSION
    }

    /// Detect and require a supported git version
    pub fn validate() -> GitResult<Self> {
        let version = Self::detect()?;

        if !version.is_supported() {
            return Err(GitError::GitVersionTooOld(version.to_string()));
        }

        Ok(version)
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
