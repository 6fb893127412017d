//! Core types for xplorer.
//!
//! This crate provides the data shared between the file operations engine
//! and its hosts: the operation tag, the error taxonomy, and the engine
//! configuration.

mod config;
mod error;
mod operation;

pub use config::{OpsConfig, OpsConfigBuilder, DEFAULT_CHUNK_SIZE};
pub use error::{OpsError, OpsResult};
pub use operation::Operation;
