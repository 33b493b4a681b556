use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use super::probe::{probe_recent_files, probe_vcs, Probe};
use super::{ContextSnapshot, EnvironmentFlags};

/// How far back a file modification counts as recent
pub const RECENT_WINDOW: Duration = Duration::from_secs(3600);
pub const RECENT_FILES_LIMIT: usize = 10;

/// Anything that can produce a context snapshot on demand.
///
/// Sampling touches the filesystem and spawns processes, so implementations
/// are synchronous; async callers should run them on the blocking pool.
pub trait ContextSource: Send + Sync + 'static {
    fn sample(&self) -> ContextSnapshot;
}

/// Samples the developer context rooted at one directory
#[derive(Debug, Clone)]
pub struct ContextSampler {
    root: PathBuf,
}

impl ContextSampler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn environment(&self) -> EnvironmentFlags {
        EnvironmentFlags {
            has_node_project: self.root.join("package.json").exists(),
            has_python_project: self.root.join("requirements.txt").exists()
                || self.root.join("pyproject.toml").exists(),
            virtual_env_name: std::env::var("VIRTUAL_ENV").ok().and_then(|venv| {
                Path::new(&venv)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            }),
        }
    }
}

impl ContextSource for ContextSampler {
    fn sample(&self) -> ContextSnapshot {
        let vcs = probe_vcs(&self.root);
        if let Some(reason) = vcs.reason() {
            debug!("No VCS info for {}: {}", self.root.display(), reason);
        }

        let recent_files = match probe_recent_files(
            &self.root,
            SystemTime::now(),
            RECENT_WINDOW,
            RECENT_FILES_LIMIT,
        ) {
            Probe::Present(files) => files,
            Probe::Absent { reason } => {
                debug!("No recent files for {}: {}", self.root.display(), reason);
                Vec::new()
            }
        };

        ContextSnapshot {
            working_directory: self.root.clone(),
            project_name: self
                .root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.root.display().to_string()),
            timestamp: Utc::now(),
            user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            shell: std::env::var("SHELL").unwrap_or_else(|_| "unknown".to_string()),
            recent_files,
            vcs: vcs.into_option(),
            environment: self.environment(),
        }
    }
}
