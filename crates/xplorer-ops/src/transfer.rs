//! Transfer primitives: chunked file copy, recursive directory copy,
//! sizing, and removal.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use walkdir::WalkDir;
use xplorer_core::{OpsConfig, OpsError, OpsResult};

use crate::progress::ProgressTracker;

/// File count and byte total of a path, measured before an operation starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measure {
    /// Number of non-directory entries.
    pub files: usize,
    /// Sum of their sizes.
    pub bytes: u64,
}

impl std::ops::AddAssign for Measure {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Measure a file, or the recursive contents of a directory, as stored on
/// disk.
///
/// Symlinks are never followed, the root included, and count with their own
/// size. This is what a delete removes and a move relocates. Fails on the
/// first entry that cannot be read.
pub fn measure(path: &Path) -> OpsResult<Measure> {
    walk(path, false)
}

/// Measure what a copy of `path` reads.
///
/// Symlinks are followed the way [`Transfer::copy_path`] follows them, so a
/// linked file counts with its target's size and a linked directory with its
/// contents. Link loops and dangling links fail here, before any byte is
/// written.
pub fn measure_contents(path: &Path) -> OpsResult<Measure> {
    walk(path, true)
}

fn walk(path: &Path, follow_links: bool) -> OpsResult<Measure> {
    let mut measure = Measure::default();

    let walker = WalkDir::new(path)
        .follow_links(follow_links)
        .follow_root_links(follow_links)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| walk_error(path, e))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| walk_error(path, e))?;
        measure.files += 1;
        measure.bytes += metadata.len();
    }

    Ok(measure)
}

fn walk_error(root: &Path, err: walkdir::Error) -> OpsError {
    let path = err.path().unwrap_or(root).to_path_buf();
    OpsError::sizing(path, io::Error::from(err))
}

/// Remove a file, symlink, or directory tree.
pub fn remove_path(path: &Path) -> OpsResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|source| OpsError::Delete {
        path: path.to_path_buf(),
        source,
    })?;

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    result.map_err(|source| OpsError::Delete {
        path: path.to_path_buf(),
        source,
    })
}

/// Copies bytes and metadata while reporting into a [`ProgressTracker`].
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    progress: &'a ProgressTracker,
    config: &'a OpsConfig,
}

impl<'a> Transfer<'a> {
    pub fn new(progress: &'a ProgressTracker, config: &'a OpsConfig) -> Self {
        Self { progress, config }
    }

    /// Copy a file or a directory tree from `src` to `dst`.
    pub fn copy_path(&self, src: &Path, dst: &Path) -> OpsResult<u64> {
        let metadata = fs::metadata(src).map_err(|e| OpsError::copy(src, e))?;
        if metadata.is_dir() {
            self.copy_dir(src, dst)
        } else {
            self.copy_file(src, dst)
        }
    }

    /// Copy a single file in fixed-size chunks.
    ///
    /// The byte counter advances after every chunk and the file counter once
    /// the copy is complete. `dst` is created or truncated; its parent must
    /// exist. On error the partial `dst` stays on disk.
    pub fn copy_file(&self, src: &Path, dst: &Path) -> OpsResult<u64> {
        let mut reader = File::open(src).map_err(|e| OpsError::copy(src, e))?;
        let mut writer = File::create(dst).map_err(|e| OpsError::copy(dst, e))?;

        self.progress.set_current_file(display_name(src));

        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        let mut copied = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(OpsError::copy(src, e)),
            };
            writer
                .write_all(&buf[..n])
                .map_err(|e| OpsError::copy(dst, e))?;
            copied += n as u64;
            self.progress.add_bytes(n as u64);
        }
        writer.flush().map_err(|e| OpsError::copy(dst, e))?;
        drop(writer);

        if self.config.preserve_permissions {
            copy_permissions(src, dst)?;
        }

        self.progress.add_files(1);
        tracing::trace!(target: "xplorer::ops", src = %src.display(), dst = %dst.display(), bytes = copied, "copied file");
        Ok(copied)
    }

    /// Recursively copy a directory.
    ///
    /// Children are visited in lexicographic order. Symlinked children are
    /// copied as what they point to: a linked directory is recursed into, a
    /// linked file is copied by content. The source directory's permissions
    /// are applied last so read-only trees can still be filled.
    pub fn copy_dir(&self, src: &Path, dst: &Path) -> OpsResult<u64> {
        fs::create_dir_all(dst).map_err(|e| OpsError::copy(dst, e))?;

        let mut entries = fs::read_dir(src)
            .and_then(|entries| entries.collect::<io::Result<Vec<_>>>())
            .map_err(|e| OpsError::copy(src, e))?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut total = 0u64;
        for entry in entries {
            let path = entry.path();
            let target = dst.join(entry.file_name());
            let file_type = entry.file_type().map_err(|e| OpsError::copy(&path, e))?;
            let is_dir = if file_type.is_symlink() {
                fs::metadata(&path)
                    .map_err(|e| OpsError::copy(&path, e))?
                    .is_dir()
            } else {
                file_type.is_dir()
            };

            total += if is_dir {
                self.copy_dir(&path, &target)?
            } else {
                self.copy_file(&path, &target)?
            };
        }

        if self.config.preserve_permissions {
            copy_permissions(src, dst)?;
        }

        Ok(total)
    }
}

fn copy_permissions(src: &Path, dst: &Path) -> OpsResult<()> {
    let permissions = fs::metadata(src)
        .map_err(|e| OpsError::copy(src, e))?
        .permissions();

    fs::set_permissions(dst, permissions).map_err(|source| OpsError::Permissions {
        path: dst.to_path_buf(),
        source,
    })
}

/// The last component of `path`, for progress display.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
