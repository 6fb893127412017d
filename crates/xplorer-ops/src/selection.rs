//! Selection set of marked paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Paths the user has marked for the next operation.
///
/// Membership only: no ordering, no validity checks. A path that was deleted
/// after being selected stays selected until the set is cleared.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    paths: HashSet<PathBuf>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the membership of `path`.
    pub fn toggle(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.paths.remove(&path) {
            self.paths.insert(path);
        }
    }

    /// Check whether `path` is selected.
    pub fn is_selected(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Drop every selected path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// All selected paths, sorted.
    pub fn all(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.paths.iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Number of selected paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
