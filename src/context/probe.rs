//! Context probes
//!
//! Each probe reads one slice of local state and reports either a value or
//! the reason it could not. Probes never fail the snapshot they feed.

use anyhow::{bail, Context};
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, SystemTime};
use walkdir::{DirEntry, WalkDir};

use super::VcsInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Present(T),
    Absent { reason: String },
}

impl<T> Probe<T> {
    pub fn absent(reason: impl fmt::Display) -> Self {
        Self::Absent {
            reason: reason.to_string(),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Present(_) => None,
            Self::Absent { reason } => Some(reason),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent { .. } => None,
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Probe<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Present(value),
            Err(e) => Self::absent(e),
        }
    }
}

fn run_git(root: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .context("failed to run git")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        bail!("git {} failed: {}", args.join(" "), stderr);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Branch, last commit and working-tree status. Any git failure (not a
/// repository, no commits yet, git missing) leaves the whole probe absent.
pub fn probe_vcs(root: &Path) -> Probe<VcsInfo> {
    let read = || -> anyhow::Result<VcsInfo> {
        let branch = run_git(root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        let last_commit = run_git(root, &["log", "-1", "--oneline"])?;
        let status = run_git(root, &["status", "--porcelain"])?;
        let modified_files = status.lines().filter(|line| !line.trim().is_empty()).count();
        Ok(VcsInfo {
            branch,
            last_commit,
            is_dirty: modified_files > 0,
            modified_files,
        })
    };
    read().into()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Files under `root` modified within `window` of `now`, newest first,
/// capped at `limit`. Hidden files and directories are skipped; unreadable
/// entries are skipped individually.
pub fn probe_recent_files(
    root: &Path,
    now: SystemTime,
    window: Duration,
    limit: usize,
) -> Probe<Vec<String>> {
    if !root.is_dir() {
        return Probe::absent(format!("{} is not a readable directory", root.display()));
    }

    let mut recent: Vec<(SystemTime, String)> = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
            continue;
        };
        // Clock skew can put mtimes in the future; count those as just touched
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age >= window {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        recent.push((modified, relative.to_string_lossy().into_owned()));
    }

    recent.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    recent.truncate(limit);
    Probe::Present(recent.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn touch(path: &Path, modified: SystemTime) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    #[test]
    fn test_recent_files_respect_the_window() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        touch(&dir.path().join("fresh.py"), now - Duration::from_secs(10));
        touch(&dir.path().join("stale.py"), now - Duration::from_secs(7200));

        let files = probe_recent_files(dir.path(), now, Duration::from_secs(3600), 10)
            .into_option()
            .unwrap();
        assert!(files.contains(&"fresh.py".to_string()));
        assert!(!files.contains(&"stale.py".to_string()));
    }

    #[test]
    fn test_recent_files_skip_hidden_and_order_newest_first() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        touch(&dir.path().join(".git/index"), now);
        touch(&dir.path().join(".env"), now);
        touch(&dir.path().join("src/old.rs"), now - Duration::from_secs(600));
        touch(&dir.path().join("src/new.rs"), now - Duration::from_secs(5));

        let files = probe_recent_files(dir.path(), now, Duration::from_secs(3600), 10)
            .into_option()
            .unwrap();
        let expected: Vec<String> = vec![
            Path::new("src").join("new.rs").to_string_lossy().into_owned(),
            Path::new("src").join("old.rs").to_string_lossy().into_owned(),
        ];
        assert_eq!(files, expected);
    }

    #[test]
    fn test_recent_files_capped() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        for i in 0..15 {
            touch(&dir.path().join(format!("f{i}.txt")), now - Duration::from_secs(i));
        }
        let files = probe_recent_files(dir.path(), now, Duration::from_secs(3600), 10)
            .into_option()
            .unwrap();
        assert_eq!(files.len(), 10);
        assert_eq!(files[0], "f0.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entries_do_not_stop_the_walk() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        symlink(dir.path().join("gone.rs"), dir.path().join("dangling.rs")).unwrap();
        let locked = dir.path().join("locked");
        touch(&locked.join("inner.rs"), now);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        touch(&dir.path().join("fresh.rs"), now - Duration::from_secs(5));

        let files = probe_recent_files(dir.path(), now, Duration::from_secs(3600), 10)
            .into_option()
            .unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(files.contains(&"fresh.rs".to_string()));
        assert!(!files.contains(&"dangling.rs".to_string()));
    }

    #[test]
    fn test_missing_root_is_absent() {
        let dir = tempdir().unwrap();
        let probe = probe_recent_files(
            &dir.path().join("nope"),
            SystemTime::now(),
            Duration::from_secs(3600),
            10,
        );
        assert!(!probe.is_present());
        assert!(probe.reason().unwrap().contains("nope"));
    }

    #[test]
    fn test_vcs_absent_outside_repository() {
        let dir = tempdir().unwrap();
        let probe = probe_vcs(dir.path());
        assert!(!probe.is_present());
        assert!(probe.reason().is_some());
    }
}
