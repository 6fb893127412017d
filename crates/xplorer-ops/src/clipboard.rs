//! Clipboard state for staged copy/cut operations.

use std::path::PathBuf;

use xplorer_core::Operation;

/// Paths staged by Copy or Cut, waiting for Paste.
///
/// Each stage call replaces the previous contents wholesale. A non-empty
/// clipboard is always tagged [`Operation::Copy`] or [`Operation::Cut`].
#[derive(Debug, Clone, Default)]
pub struct ClipboardState {
    paths: Vec<PathBuf>,
    operation: Operation,
}

impl ClipboardState {
    /// Stage paths for copying.
    pub fn copy(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.stage(paths, Operation::Copy);
    }

    /// Stage paths for moving.
    pub fn cut(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.stage(paths, Operation::Cut);
    }

    fn stage(&mut self, paths: impl IntoIterator<Item = PathBuf>, operation: Operation) {
        debug_assert!(operation.is_clipboard(), "{operation} cannot be staged");
        self.paths = paths.into_iter().collect();
        self.operation = if self.paths.is_empty() {
            Operation::None
        } else {
            operation
        };
    }

    /// Empty the clipboard.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.operation = Operation::None;
    }

    /// The staged paths, in staging order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The staged operation tag.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Check if the clipboard is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Get the number of staged paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_replaces_contents() {
        let mut clipboard = ClipboardState::default();
        clipboard.copy(vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(clipboard.operation(), Operation::Copy);
        assert_eq!(clipboard.len(), 2);

        clipboard.cut(vec![PathBuf::from("/c")]);
        assert_eq!(clipboard.operation(), Operation::Cut);
        assert_eq!(clipboard.paths(), &[PathBuf::from("/c")]);
    }

    #[test]
    fn test_empty_stage_has_no_tag() {
        let mut clipboard = ClipboardState::default();
        clipboard.cut(Vec::new());
        assert!(clipboard.is_empty());
        assert_eq!(clipboard.operation(), Operation::None);
    }

    #[test]
    fn test_clear() {
        let mut clipboard = ClipboardState::default();
        clipboard.copy(vec![PathBuf::from("/a")]);
        clipboard.clear();
        assert!(clipboard.is_empty());
        assert_eq!(clipboard.operation(), Operation::None);
    }
}
