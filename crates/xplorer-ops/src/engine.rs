//! Execution engine: stages clipboard contents and runs paste, delete,
//! rename, and create against the filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use xplorer_core::{Operation, OpsConfig, OpsError, OpsResult};

use crate::clipboard::ClipboardState;
use crate::conflict;
use crate::create;
use crate::operation::{Completion, OperationEvent, OperationSummary};
use crate::progress::ProgressTracker;
use crate::rename;
use crate::selection::SelectionSet;
use crate::transfer::{display_name, measure, measure_contents, remove_path, Measure, Transfer};
use crate::OPERATION_CHANNEL_SIZE;

/// File operations manager.
///
/// Owns the selection and clipboard, which are only touched through
/// `&mut self` from the input context, and shares a [`ProgressTracker`] with
/// whoever renders progress. At most one paste or delete runs at a time;
/// starting another one fails with [`OpsError::Busy`].
#[derive(Debug)]
pub struct FileOps {
    selection: SelectionSet,
    clipboard: ClipboardState,
    generation: u64,
    progress: Arc<ProgressTracker>,
    busy: Arc<AtomicBool>,
    config: Arc<OpsConfig>,
}

impl Default for FileOps {
    fn default() -> Self {
        Self::new()
    }
}

impl FileOps {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(OpsConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(config: OpsConfig) -> Self {
        Self {
            selection: SelectionSet::new(),
            clipboard: ClipboardState::default(),
            generation: 0,
            progress: Arc::new(ProgressTracker::new()),
            busy: Arc::new(AtomicBool::new(false)),
            config: Arc::new(config),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &OpsConfig {
        &self.config
    }

    // Selection

    /// Flip the selection state of `path`.
    pub fn toggle_selection(&mut self, path: impl Into<PathBuf>) {
        self.selection.toggle(path);
    }

    /// Check whether `path` is selected.
    pub fn is_selected(&self, path: &Path) -> bool {
        self.selection.is_selected(path)
    }

    /// Drop the selection, e.g. after the browser changed directory.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The current selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    // Clipboard

    /// Stage `paths` for copying, replacing the clipboard.
    pub fn copy(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.clipboard.copy(paths);
        self.generation += 1;
        tracing::debug!(target: "xplorer::ops", count = self.clipboard.len(), "staged copy");
    }

    /// Stage `paths` for moving, replacing the clipboard.
    pub fn cut(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.clipboard.cut(paths);
        self.generation += 1;
        tracing::debug!(target: "xplorer::ops", count = self.clipboard.len(), "staged cut");
    }

    /// Stage the selection for copying and clear it.
    pub fn copy_selected(&mut self) {
        let paths = self.selection.all();
        self.selection.clear();
        self.copy(paths);
    }

    /// Stage the selection for moving and clear it.
    pub fn cut_selected(&mut self) {
        let paths = self.selection.all();
        self.selection.clear();
        self.cut(paths);
    }

    /// The staged clipboard.
    pub fn clipboard(&self) -> &ClipboardState {
        &self.clipboard
    }

    /// Check if anything is staged for paste.
    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    // Progress

    /// Shared handle to the progress record, for the renderer.
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    /// Whether a paste or delete is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    // Operations

    /// Paste the clipboard into `dest_dir`, blocking until done.
    pub fn paste(&mut self, dest_dir: impl AsRef<Path>) -> OpsResult<OperationSummary> {
        let job = self.paste_job(dest_dir.as_ref())?;
        let completion = self.run_blocking(job, Some(self.generation))?;
        self.finish(completion)
    }

    /// Delete `paths` recursively, blocking until done.
    pub fn delete(&mut self, paths: Vec<PathBuf>) -> OpsResult<OperationSummary> {
        let completion = self.run_blocking(Job::Delete { targets: paths }, None)?;
        self.finish(completion)
    }

    /// Paste the clipboard into `dest_dir` on a blocking worker.
    ///
    /// Must be called from within a Tokio runtime. Pass the final
    /// [`Completion`] back to [`FileOps::finish`].
    pub fn start_paste(&self, dest_dir: impl AsRef<Path>) -> OpsResult<OperationHandle> {
        let job = self.paste_job(dest_dir.as_ref())?;
        self.spawn(job, Some(self.generation))
    }

    /// Delete `paths` recursively on a blocking worker.
    ///
    /// Must be called from within a Tokio runtime. Pass the final
    /// [`Completion`] back to [`FileOps::finish`].
    pub fn start_delete(&self, paths: Vec<PathBuf>) -> OpsResult<OperationHandle> {
        self.spawn(Job::Delete { targets: paths }, None)
    }

    /// Apply the side effects of a finished paste or delete.
    ///
    /// A successful cut-paste empties the clipboard, unless something new was
    /// staged while it ran. The selection is cleared either way.
    pub fn finish(&mut self, completion: Completion) -> OpsResult<OperationSummary> {
        self.selection.clear();

        if let Ok(summary) = &completion.outcome {
            if summary.operation == Operation::Cut && completion.staged == Some(self.generation) {
                self.clipboard.clear();
            }
        }

        completion.outcome
    }

    /// Rename `old_path` to `new_name` in the same directory.
    pub fn rename(&self, old_path: impl AsRef<Path>, new_name: &str) -> OpsResult<PathBuf> {
        rename::rename(old_path.as_ref(), new_name)
    }

    /// Create an empty file in `dir`.
    pub fn create_file(&self, dir: impl AsRef<Path>, name: &str) -> OpsResult<PathBuf> {
        create::create_file(dir.as_ref(), name)
    }

    /// Create an empty folder in `dir`.
    pub fn create_folder(&self, dir: impl AsRef<Path>, name: &str) -> OpsResult<PathBuf> {
        create::create_folder(dir.as_ref(), name)
    }

    fn paste_job(&self, dest_dir: &Path) -> OpsResult<Job> {
        if self.clipboard.is_empty() {
            return Err(OpsError::EmptyClipboard);
        }
        Ok(Job::Paste {
            operation: self.clipboard.operation(),
            sources: self.clipboard.paths().to_vec(),
            dest_dir: dest_dir.to_path_buf(),
        })
    }

    fn run_blocking(&self, job: Job, staged: Option<u64>) -> OpsResult<Completion> {
        let guard = InFlight::acquire(&self.busy)?;
        let operation = job.operation();
        let outcome = job.run(&self.progress, &self.config, None);
        drop(guard);

        Ok(Completion {
            operation,
            staged,
            outcome,
        })
    }

    fn spawn(&self, job: Job, staged: Option<u64>) -> OpsResult<OperationHandle> {
        let guard = InFlight::acquire(&self.busy)?;
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let progress = Arc::clone(&self.progress);
        let config = Arc::clone(&self.config);
        let operation = job.operation();

        tokio::task::spawn_blocking(move || {
            let outcome = job.run(&progress, &config, Some(&tx));
            // Release before reporting so the receiver can start the next one.
            drop(guard);
            let _ = tx.blocking_send(OperationEvent::Complete(Completion {
                operation,
                staged,
                outcome,
            }));
        });

        Ok(OperationHandle { operation, rx })
    }
}

/// Receiving end of a background paste or delete.
#[derive(Debug)]
pub struct OperationHandle {
    operation: Operation,
    rx: mpsc::Receiver<OperationEvent>,
}

impl OperationHandle {
    /// The operation being run.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Wait for the next event. Returns `None` once the operation is over.
    pub async fn recv(&mut self) -> Option<OperationEvent> {
        self.rx.recv().await
    }

    /// Poll for an event without waiting.
    pub fn try_recv(&mut self) -> Option<OperationEvent> {
        self.rx.try_recv().ok()
    }

    /// Skip progress events and wait for the completion.
    pub async fn wait(mut self) -> Completion {
        while let Some(event) = self.rx.recv().await {
            if let OperationEvent::Complete(completion) = event {
                return completion;
            }
        }

        Completion {
            operation: self.operation,
            staged: None,
            outcome: Err(OpsError::Task {
                message: "operation ended without reporting a result".to_string(),
            }),
        }
    }
}

/// Marks the engine busy for as long as it lives.
#[derive(Debug)]
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> OpsResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OpsError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A captured paste or delete, independent of the engine's mutable state.
#[derive(Debug, Clone)]
enum Job {
    Paste {
        operation: Operation,
        sources: Vec<PathBuf>,
        dest_dir: PathBuf,
    },
    Delete {
        targets: Vec<PathBuf>,
    },
}

impl Job {
    fn operation(&self) -> Operation {
        match self {
            Self::Paste { operation, .. } => *operation,
            Self::Delete { .. } => Operation::Delete,
        }
    }

    fn run(
        self,
        progress: &ProgressTracker,
        config: &OpsConfig,
        events: Option<&mpsc::Sender<OperationEvent>>,
    ) -> OpsResult<OperationSummary> {
        let operation = self.operation();
        let paths = match &self {
            Self::Paste { sources, .. } => sources,
            Self::Delete { targets } => targets,
        };

        if let Self::Paste {
            sources, dest_dir, ..
        } = &self
        {
            if let Err(err) = check_destination(sources, dest_dir) {
                if err.is_validation() {
                    tracing::debug!(target: "xplorer::ops", %operation, "paste rejected: {err}");
                } else {
                    tracing::warn!(target: "xplorer::ops", %operation, "paste rejected: {err}");
                }
                return Err(err);
            }
        }

        // Sizing. A copy reads through symlinks; move and delete act on
        // the entries themselves.
        let mut sizes = Vec::with_capacity(paths.len());
        let mut total = Measure::default();
        for path in paths {
            let size = if operation == Operation::Copy {
                measure_contents(path)?
            } else {
                measure(path)?
            };
            total += size;
            sizes.push(size);
        }

        // Active
        progress.start(operation, total.files, total.bytes);
        let started = Instant::now();
        tracing::debug!(
            target: "xplorer::ops",
            %operation,
            paths = paths.len(),
            files = total.files,
            bytes = total.bytes,
            "operation started"
        );

        let result = match &self {
            Self::Paste {
                operation,
                sources,
                dest_dir,
            } => paste_all(*operation, sources, &sizes, dest_dir, progress, config, events),
            Self::Delete { targets } => delete_all(targets, &sizes, progress, events),
        };

        // Finishing
        progress.finish();
        let snapshot = progress.snapshot();

        match result {
            Ok(paths) => {
                let summary = OperationSummary {
                    operation,
                    files: snapshot.processed_files,
                    bytes: snapshot.processed_bytes,
                    paths,
                    elapsed: started.elapsed(),
                };
                tracing::info!(target: "xplorer::ops", "{}", summary.summary());
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(
                    target: "xplorer::ops",
                    %operation,
                    processed_files = snapshot.processed_files,
                    "operation aborted: {err}"
                );
                Err(err)
            }
        }
    }
}

/// Pre-flight checks for a paste into `dest_dir`.
fn check_destination(sources: &[PathBuf], dest_dir: &Path) -> OpsResult<()> {
    let metadata = fs::metadata(dest_dir).map_err(|e| OpsError::sizing(dest_dir, e))?;
    if !metadata.is_dir() {
        return Err(OpsError::NotADirectory {
            path: dest_dir.to_path_buf(),
        });
    }

    let dest = fs::canonicalize(dest_dir).unwrap_or_else(|_| dest_dir.to_path_buf());
    for source in sources {
        if !source.is_dir() {
            continue;
        }
        let source_abs = fs::canonicalize(source).unwrap_or_else(|_| source.clone());
        if dest.starts_with(&source_abs) {
            return Err(OpsError::IntoItself {
                path: source.clone(),
            });
        }
    }

    Ok(())
}

fn paste_all(
    operation: Operation,
    sources: &[PathBuf],
    sizes: &[Measure],
    dest_dir: &Path,
    progress: &ProgressTracker,
    config: &OpsConfig,
    events: Option<&mpsc::Sender<OperationEvent>>,
) -> OpsResult<Vec<PathBuf>> {
    let transfer = Transfer::new(progress, config);
    let mut created = Vec::with_capacity(sources.len());

    for (source, size) in sources.iter().zip(sizes) {
        let Some(name) = source.file_name() else {
            let err = io::Error::new(io::ErrorKind::InvalidInput, "path has no file name");
            return Err(paste_error(operation, source, err));
        };

        let wanted = dest_dir.join(name);
        let dest = conflict::resolve(&wanted).map_err(|e| paste_error(operation, &wanted, e))?;
        progress.set_current_file(display_name(source));
        tracing::debug!(target: "xplorer::ops", src = %source.display(), dst = %dest.display(), %operation, "pasting");

        if operation == Operation::Cut {
            fs::rename(source, &dest).map_err(|e| OpsError::Move {
                path: source.clone(),
                source: e,
            })?;
            progress.add_bytes(size.bytes);
            progress.add_files(size.files);
        } else {
            transfer.copy_path(source, &dest)?;
        }

        created.push(dest);
        emit_progress(events, progress);
    }

    Ok(created)
}

fn paste_error(operation: Operation, path: &Path, source: io::Error) -> OpsError {
    match operation {
        Operation::Cut => OpsError::Move {
            path: path.to_path_buf(),
            source,
        },
        _ => OpsError::copy(path, source),
    }
}

fn delete_all(
    targets: &[PathBuf],
    sizes: &[Measure],
    progress: &ProgressTracker,
    events: Option<&mpsc::Sender<OperationEvent>>,
) -> OpsResult<Vec<PathBuf>> {
    let mut removed = Vec::with_capacity(targets.len());

    for (target, size) in targets.iter().zip(sizes) {
        progress.set_current_file(display_name(target));
        tracing::debug!(target: "xplorer::ops", path = %target.display(), "deleting");

        remove_path(target)?;
        progress.add_bytes(size.bytes);
        progress.add_files(size.files);

        removed.push(target.clone());
        emit_progress(events, progress);
    }

    Ok(removed)
}

/// Offer a snapshot to the handle without ever blocking the transfer.
fn emit_progress(events: Option<&mpsc::Sender<OperationEvent>>, progress: &ProgressTracker) {
    if let Some(tx) = events {
        let _ = tx.try_send(OperationEvent::Progress(progress.snapshot()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paste_requires_clipboard() {
        let dir = TempDir::new().unwrap();
        let mut ops = FileOps::new();
        assert!(matches!(
            ops.paste(dir.path()),
            Err(OpsError::EmptyClipboard)
        ));
        assert!(!ops.progress().snapshot().has_data());
    }

    #[test]
    fn test_paste_into_file_fails() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let not_dir = dir.path().join("b.txt");
        fs::write(&src, b"a").unwrap();
        fs::write(&not_dir, b"b").unwrap();

        let mut ops = FileOps::new();
        ops.copy(vec![src]);
        assert!(matches!(
            ops.paste(&not_dir),
            Err(OpsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_paste_dir_into_itself_fails() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("inner")).unwrap();

        let mut ops = FileOps::new();
        ops.copy(vec![tree.clone()]);
        let err = ops.paste(tree.join("inner")).unwrap_err();
        assert!(matches!(err, OpsError::IntoItself { ref path } if *path == tree));
        assert!(!tree.join("inner/tree").exists());
    }

    #[test]
    fn test_busy_guard() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = InFlight::acquire(&flag).unwrap();
        assert!(matches!(InFlight::acquire(&flag), Err(OpsError::Busy)));
        drop(guard);
        assert!(InFlight::acquire(&flag).is_ok());
    }

    #[test]
    fn test_copy_selected_stages_and_clears() {
        let mut ops = FileOps::new();
        ops.toggle_selection("/tmp/b");
        ops.toggle_selection("/tmp/a");
        ops.copy_selected();

        assert!(ops.selection().is_empty());
        assert_eq!(ops.clipboard().operation(), Operation::Copy);
        assert_eq!(
            ops.clipboard().paths(),
            &[PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]
        );
    }

    #[test]
    fn test_cut_clipboard_survives_restage() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("dest");
        fs::write(&src, b"a").unwrap();
        fs::create_dir(&dest).unwrap();

        let mut ops = FileOps::new();
        ops.cut(vec![src.clone()]);
        let job = ops.paste_job(&dest).unwrap();
        let completion = ops.run_blocking(job, Some(ops.generation)).unwrap();

        // Something new was staged while the cut was running.
        ops.copy(vec![dest.join("a.txt")]);
        ops.finish(completion).unwrap();

        assert!(ops.has_clipboard());
        assert_eq!(ops.clipboard().operation(), Operation::Copy);
    }
}
