use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version-control state of the sampled directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    pub branch: String,
    /// One-line summary of the most recent commit
    pub last_commit: String,
    pub is_dirty: bool,
    pub modified_files: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentFlags {
    pub has_node_project: bool,
    pub has_python_project: bool,
    pub virtual_env_name: Option<String>,
}

/// Point-in-time capture of the developer's working context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub working_directory: PathBuf,
    pub project_name: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub shell: String,
    /// Most recently modified first, relative to `working_directory`
    pub recent_files: Vec<String>,
    pub vcs: Option<VcsInfo>,
    pub environment: EnvironmentFlags,
}

impl ContextSnapshot {
    pub fn branch(&self) -> Option<&str> {
        self.vcs.as_ref().map(|vcs| vcs.branch.as_str())
    }

    pub fn is_dirty(&self) -> Option<bool> {
        self.vcs.as_ref().map(|vcs| vcs.is_dirty)
    }
}
