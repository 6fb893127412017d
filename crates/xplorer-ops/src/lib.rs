//! File operations engine for xplorer.
//!
//! This crate provides the selection set, clipboard, conflict resolution,
//! and a copy/move/delete engine that publishes live progress through a
//! shared [`ProgressTracker`]. Paste and delete can run on a blocking worker
//! and stream [`OperationEvent`]s over a channel while the caller keeps
//! polling the tracker.
//!
//! # Example
//!
//! ```rust,no_run
//! use xplorer_ops::FileOps;
//!
//! let mut ops = FileOps::new();
//! ops.toggle_selection("/home/user/notes.txt");
//! ops.copy_selected();
//!
//! let summary = ops.paste("/home/user/backup").unwrap();
//! println!("{}", summary.summary());
//! ```

mod clipboard;
mod conflict;
mod create;
mod engine;
mod operation;
mod progress;
mod rename;
mod selection;
mod transfer;

pub use clipboard::ClipboardState;
pub use conflict::{is_free, resolve};
pub use engine::{FileOps, OperationHandle};
pub use operation::{Completion, OperationEvent, OperationSummary};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use rename::validate_name;
pub use selection::SelectionSet;
pub use transfer::{measure, measure_contents, remove_path, Measure, Transfer};

// Re-export core types for convenience
pub use xplorer_core::{Operation, OpsConfig, OpsError, OpsResult};

/// Default channel buffer size for operation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
