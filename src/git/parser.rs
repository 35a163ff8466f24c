use crate::error::GitResult;

/// Parse git status --porcelain=v2 output
pub fn parse_status_porcelain_v2(output: &str) -> GitResult<Vec<StatusEntry>> {
    let mut entries = Vec::new();

    for line in output.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "1" | "2" => {
                // Tracked entry format: 1 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <path>
                if parts.len() >= 9 {
                    let xy = parts[1];
                    let path = parts[8..].join(" ");

                    let status = match xy {
                        "M." | ".M" | "MM" => FileStatus::Modified,
                        "A." | ".A" => FileStatus::Added,
                        "D." | ".D" => FileStatus::Deleted,
                        _ => FileStatus::Unknown,
                    };

                    let staged = !xy.starts_with('.');
                    let unstaged = xy.chars().nth(1).is_some_and(|c| c != '.');

                    entries.push(StatusEntry {
                        status,
                        path,
                        staged,
                        unstaged,
                    });
                }
            }
            "?" => {
                // Untracked file: ? <path>
                if parts.len() >= 2 {
                    let path = parts[1..].join(" ");
                    entries.push(StatusEntry {
                        status: FileStatus::Untracked,
                        path,
                        staged: false,
                        unstaged: false,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(entries)
}

/// Parse git log output with format %H%x00%s
pub fn parse_log(output: &str) -> GitResult<Vec<CommitEntry>> {
    let mut commits = Vec::new();

    for line in output.lines() {
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('\0').collect();
        if parts.len() >= 2 {
            commits.push(CommitEntry {
                hash: parts[0].to_string(),
                message: parts[1].to_string(),
            });
        } else if parts.len() == 1 {
            // Handle case where there's no message
            commits.push(CommitEntry {
                hash: parts[0].to_string(),
                message: String::new(),
            });
        }
    }

    Ok(commits)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Untracked,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub status: FileStatus,
    pub path: String,
    pub staged: bool,
    pub unstaged: bool,
}

#[derive(Debug, Clone)]
pub struct CommitEntry {
    pub hash: String,
    pub message: String,
}
