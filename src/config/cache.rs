//! Local snapshot cache configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Local snapshot cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path of the JSON snapshot file
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl CacheConfig {
    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CACHE_SNAPSHOT_PATH"));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/billing_cache.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let config = CacheConfig::default();
        assert_eq!(config.snapshot_path, PathBuf::from("data/billing_cache.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = CacheConfig {
            snapshot_path: PathBuf::new(),
        };
        assert!(config.validate().is_err());
    }
}
