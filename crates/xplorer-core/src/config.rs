//! Engine configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Size of each read/write chunk when streaming a file copy.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Configuration for the file operations engine.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OpsConfig {
    /// Bytes read and written per chunk; the progress byte counter
    /// advances once per chunk.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Copy permission bits from source to destination.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub preserve_permissions: bool,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

impl OpsConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl OpsConfig {
    /// Create a new config builder.
    pub fn builder() -> OpsConfigBuilder {
        OpsConfigBuilder::default()
    }
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            preserve_permissions: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OpsConfig::builder()
            .chunk_size(4096usize)
            .preserve_permissions(false)
            .build()
            .unwrap();

        assert_eq!(config.chunk_size, 4096);
        assert!(!config.preserve_permissions);
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = OpsConfig::builder().build().unwrap();
        assert_eq!(config, OpsConfig::default());
        assert_eq!(config.chunk_size, 32 * 1024);
    }

    #[test]
    fn test_config_rejects_zero_chunk() {
        assert!(OpsConfig::builder().chunk_size(0usize).build().is_err());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: OpsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, OpsConfig::default());
    }
}
