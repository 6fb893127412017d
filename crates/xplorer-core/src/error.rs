//! Error types for file operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the operations engine.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors that can occur while staging or executing a file operation.
///
/// Every filesystem failure carries the path it happened on together with the
/// underlying OS error.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Paste was requested with nothing staged.
    #[error("Clipboard is empty")]
    EmptyClipboard,

    /// A rename or create was given an empty name.
    #[error("Name cannot be empty (in {dir})")]
    EmptyName { dir: PathBuf },

    /// A rename or create was given a name that is not a single path component.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The rename or create target is already taken.
    #[error("Already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The paste destination is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A directory would be pasted into itself or one of its descendants.
    #[error("Cannot paste {path} into itself")]
    IntoItself { path: PathBuf },

    /// Another paste or delete is still running.
    #[error("Another file operation is already in progress")]
    Busy,

    /// A staged path could not be measured before the operation started.
    #[error("Failed to read {path}: {source}")]
    Sizing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading, writing or creating a file failed mid-copy.
    #[error("Failed to copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Applying the source permissions to a copy failed.
    #[error("Failed to set permissions on {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Moving a path failed.
    #[error("Failed to move {path}: {source}")]
    Move {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing a path failed.
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Renaming a path failed.
    #[error("Failed to rename {path}: {source}")]
    Rename {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Creating a file or folder failed.
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The background task running the operation panicked or was aborted.
    #[error("Task failed: {message}")]
    Task { message: String },
}

impl OpsError {
    /// Create a sizing error with path context.
    pub fn sizing(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Sizing {
            path: path.into(),
            source,
        }
    }

    /// Create a copy error with path context.
    pub fn copy(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Copy {
            path: path.into(),
            source,
        }
    }

    /// The path the error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::EmptyName { dir: path }
            | Self::AlreadyExists { path }
            | Self::NotADirectory { path }
            | Self::IntoItself { path }
            | Self::Sizing { path, .. }
            | Self::Copy { path, .. }
            | Self::Permissions { path, .. }
            | Self::Move { path, .. }
            | Self::Delete { path, .. }
            | Self::Rename { path, .. }
            | Self::Create { path, .. } => Some(path),
            Self::EmptyClipboard | Self::InvalidName { .. } | Self::Busy | Self::Task { .. } => {
                None
            }
        }
    }

    /// Whether the error was raised before anything on disk was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyClipboard
                | Self::EmptyName { .. }
                | Self::InvalidName { .. }
                | Self::NotADirectory { .. }
                | Self::IntoItself { .. }
                | Self::Busy
        )
    }
}
