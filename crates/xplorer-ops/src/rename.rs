//! Rename operation.

use std::fs;
use std::path::{Path, PathBuf};

use xplorer_core::{OpsError, OpsResult};

use crate::conflict::is_free;

/// Validate a single path component used for rename or create.
pub fn validate_name(dir: &Path, name: &str) -> OpsResult<()> {
    if name.is_empty() {
        return Err(OpsError::EmptyName {
            dir: dir.to_path_buf(),
        });
    }

    let reason = if name == "." || name == ".." {
        Some("'.' and '..' are reserved names")
    } else if name.contains('\0') {
        Some("name cannot contain NUL")
    } else if name.chars().any(std::path::is_separator) {
        Some("name cannot contain a path separator")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(OpsError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Rename `old_path` to `new_name` within the same directory.
///
/// Renaming to the current name is a no-op. An existing target is never
/// overwritten or disambiguated.
pub fn rename(old_path: &Path, new_name: &str) -> OpsResult<PathBuf> {
    let dir = old_path.parent().unwrap_or(Path::new(""));
    validate_name(dir, new_name)?;

    let new_path = dir.join(new_name);
    if new_path == old_path {
        return Ok(new_path);
    }

    let free = is_free(&new_path).map_err(|source| OpsError::Rename {
        path: old_path.to_path_buf(),
        source,
    })?;
    if !free {
        return Err(OpsError::AlreadyExists { path: new_path });
    }

    fs::rename(old_path, &new_path).map_err(|source| OpsError::Rename {
        path: old_path.to_path_buf(),
        source,
    })?;

    tracing::debug!(target: "xplorer::ops", from = %old_path.display(), to = %new_path.display(), "renamed");
    Ok(new_path)
}
