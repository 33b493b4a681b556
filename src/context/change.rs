use std::collections::HashSet;

use super::ContextSnapshot;

/// Whether `current` differs materially from `previous`.
///
/// Only the working directory, branch, recent-file set and dirty flag count.
/// Timestamps, commit summaries and file counts are ignored.
pub fn has_changed(current: &ContextSnapshot, previous: Option<&ContextSnapshot>) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    if current.working_directory != previous.working_directory {
        return true;
    }
    if current.branch() != previous.branch() {
        return true;
    }

    let current_files: HashSet<&String> = current.recent_files.iter().collect();
    let previous_files: HashSet<&String> = previous.recent_files.iter().collect();
    if current_files != previous_files {
        return true;
    }

    current.is_dirty() != previous.is_dirty()
}

/// Remembers the last emitted snapshot
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_emitted: Option<ContextSnapshot>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_changed(&self, current: &ContextSnapshot) -> bool {
        has_changed(current, self.last_emitted.as_ref())
    }

    /// Mark `snapshot` as emitted
    pub fn accept(&mut self, snapshot: ContextSnapshot) {
        self.last_emitted = Some(snapshot);
    }
}
