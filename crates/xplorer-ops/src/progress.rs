//! Shared progress record for the operation in flight.
//!
//! The engine is the only writer. Any number of readers (typically the
//! render loop) take [`ProgressSnapshot`]s whenever they redraw. Writers hold
//! the exclusive lock only for the duration of a field update, never across
//! filesystem calls.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use xplorer_core::Operation;

#[derive(Debug, Default)]
struct ProgressState {
    operation: Operation,
    total_files: usize,
    processed_files: usize,
    total_bytes: u64,
    processed_bytes: u64,
    current_file: String,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    active: bool,
}

/// Lock-protected live status of the running operation.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: RwLock<ProgressState>,
}

impl ProgressTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counters and mark a new operation active.
    pub fn start(&self, operation: Operation, total_files: usize, total_bytes: u64) {
        let mut state = self.state.write();
        *state = ProgressState {
            operation,
            total_files,
            total_bytes,
            started_at: Some(Instant::now()),
            active: true,
            ..ProgressState::default()
        };
    }

    /// Record the name of the file currently being processed.
    pub fn set_current_file(&self, name: impl Into<String>) {
        let name = name.into();
        self.state.write().current_file = name;
    }

    /// Advance the byte counter, never past the total.
    pub fn add_bytes(&self, bytes: u64) {
        let mut state = self.state.write();
        state.processed_bytes = state
            .processed_bytes
            .saturating_add(bytes)
            .min(state.total_bytes);
    }

    /// Advance the file counter, never past the total.
    pub fn add_files(&self, files: usize) {
        let mut state = self.state.write();
        state.processed_files = state
            .processed_files
            .saturating_add(files)
            .min(state.total_files);
    }

    /// Mark the operation inactive. Final counters are kept for display.
    pub fn finish(&self) {
        let mut state = self.state.write();
        state.active = false;
        state.finished_at = Some(Instant::now());
    }

    /// Forget the last operation's counters once the renderer is done with them.
    ///
    /// Has no effect while an operation is active.
    pub fn clear(&self) {
        let mut state = self.state.write();
        if !state.active {
            *state = ProgressState::default();
        }
    }

    /// Whether an operation is currently running.
    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    /// Take a consistent copy of the current counters.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.read();
        let elapsed = match (state.started_at, state.finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        };

        ProgressSnapshot {
            operation: state.operation,
            total_files: state.total_files,
            processed_files: state.processed_files,
            total_bytes: state.total_bytes,
            processed_bytes: state.processed_bytes,
            current_file: state.current_file.clone(),
            elapsed,
            active: state.active,
        }
    }
}

/// A point-in-time copy of the tracker, safe to hold while rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub operation: Operation,
    pub total_files: usize,
    pub processed_files: usize,
    pub total_bytes: u64,
    pub processed_bytes: u64,
    pub current_file: String,
    pub elapsed: Duration,
    pub active: bool,
}

impl ProgressSnapshot {
    /// Integer percentage of bytes processed (0 when the total is unknown).
    pub fn percent(&self) -> u64 {
        if self.total_bytes == 0 {
            return 0;
        }
        (u128::from(self.processed_bytes) * 100 / u128::from(self.total_bytes)) as u64
    }

    /// Bytes per second since the operation started.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Estimated time remaining at the current throughput.
    pub fn eta(&self) -> Duration {
        let throughput = self.throughput();
        if throughput <= 0.0 {
            return Duration::ZERO;
        }
        let remaining = self.total_bytes.saturating_sub(self.processed_bytes);
        Duration::try_from_secs_f64(remaining as f64 / throughput).unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot carries anything worth drawing.
    pub fn has_data(&self) -> bool {
        self.active || self.total_files > 0 || self.total_bytes > 0
    }
}
