//! File and folder creation.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use xplorer_core::{OpsError, OpsResult};

use crate::conflict::is_free;
use crate::rename::validate_name;

/// Create an empty file named `name` inside `dir`.
pub fn create_file(dir: &Path, name: &str) -> OpsResult<PathBuf> {
    let path = target(dir, name)?;

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| create_error(&path, source))?;

    tracing::debug!(target: "xplorer::ops", path = %path.display(), "created file");
    Ok(path)
}

/// Create an empty folder named `name` inside `dir`.
pub fn create_folder(dir: &Path, name: &str) -> OpsResult<PathBuf> {
    let path = target(dir, name)?;

    fs::create_dir(&path).map_err(|source| create_error(&path, source))?;

    tracing::debug!(target: "xplorer::ops", path = %path.display(), "created folder");
    Ok(path)
}

fn target(dir: &Path, name: &str) -> OpsResult<PathBuf> {
    validate_name(dir, name)?;

    let path = dir.join(name);
    let free = is_free(&path).map_err(|source| OpsError::Create {
        path: path.clone(),
        source,
    })?;
    if !free {
        return Err(OpsError::AlreadyExists { path });
    }
    Ok(path)
}

fn create_error(path: &Path, source: std::io::Error) -> OpsError {
    // Lost a race with another writer between the check and the create.
    if source.kind() == std::io::ErrorKind::AlreadyExists {
        return OpsError::AlreadyExists {
            path: path.to_path_buf(),
        };
    }
    OpsError::Create {
        path: path.to_path_buf(),
        source,
    }
}
