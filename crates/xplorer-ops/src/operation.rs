//! Operation results and events.

use std::path::PathBuf;
use std::time::Duration;

use humansize::{format_size, BINARY};
use serde::Serialize;
use xplorer_core::{Operation, OpsResult};

use crate::progress::ProgressSnapshot;

/// Result of a completed paste or delete.
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    /// The operation that ran.
    pub operation: Operation,
    /// Files processed, counted recursively.
    pub files: usize,
    /// Bytes processed.
    pub bytes: u64,
    /// Paths produced by a paste, or removed by a delete.
    pub paths: Vec<PathBuf>,
    /// Wall time spent after sizing.
    pub elapsed: Duration,
}

impl OperationSummary {
    /// Get a human-readable summary of the operation.
    pub fn summary(&self) -> String {
        let items = self.paths.len();
        format!(
            "{} {} {} ({})",
            self.operation.past_tense(),
            items,
            if items == 1 { "item" } else { "items" },
            format_size(self.bytes, BINARY)
        )
    }
}

/// Everything the input context needs to settle a finished operation.
///
/// Hand it to [`FileOps::finish`](crate::FileOps::finish) to apply the
/// clipboard and selection side effects.
#[derive(Debug)]
pub struct Completion {
    /// The operation that ran.
    pub operation: Operation,
    /// Clipboard generation the paste consumed, if it was a paste.
    pub(crate) staged: Option<u64>,
    /// Success summary or the error that aborted the batch.
    pub outcome: OpsResult<OperationSummary>,
}

/// Message sent from a background operation to its handle.
#[derive(Debug)]
pub enum OperationEvent {
    /// Counters after a staged path finished.
    Progress(ProgressSnapshot),
    /// The operation is over.
    Complete(Completion),
}
