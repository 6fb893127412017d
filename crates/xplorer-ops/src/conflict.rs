//! Destination conflict resolution.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Check whether nothing occupies `path`.
///
/// Only `NotFound` means free. Symlinks are not followed, so a dangling link
/// still counts as taken. Any other stat failure (permission denied, a file
/// used as a directory) is returned, since the name cannot be judged.
pub fn is_free(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

/// Resolve a destination that does not collide with an existing entry.
///
/// Returns `dest` unchanged when it is free. Otherwise tries
/// `name_copy1.ext`, `name_copy2.ext`, ... and returns the first free one.
/// The probe is unbounded; it stops early only when a candidate cannot be
/// checked.
pub fn resolve(dest: &Path) -> io::Result<PathBuf> {
    if is_free(dest)? {
        return Ok(dest.to_path_buf());
    }

    let mut n: u64 = 1;
    loop {
        let candidate = copy_name(dest, n);
        if is_free(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Build the `n`th disambiguated sibling of `path`.
///
/// Only the last extension is kept apart: `archive.tar.gz` becomes
/// `archive.tar_copy1.gz`, and dotfiles like `.bashrc` become `.bashrc_copy1`.
fn copy_name(path: &Path, n: u64) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default();

    let mut name = OsString::from(stem);
    name.push(format!("_copy{n}"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    path.with_file_name(name)
}
