pub mod executor;
pub mod parser;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use executor::{CommandExecutor, ExecError, ExecOutput};
pub use parser::{CommitEntry, FileStatus, StatusEntry, parse_log, parse_status_porcelain_v2};
pub use repository::{Repository, UpstreamInfo, WorkspaceState};
pub use version::GitVersion;
