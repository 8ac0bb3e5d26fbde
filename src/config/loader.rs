//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the engine
//! configuration and optional seed data from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{EngineConfig, SeedData};

/// Name of the engine configuration file inside a config directory.
pub const CONFIG_FILE_NAME: &str = "attendance.yaml";

/// Largest UTC offset accepted, in minutes (UTC+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── attendance.yaml   # Thresholds, tolerances, server settings
/// └── seed.yaml         # Optional directory data for the demo server
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config").unwrap();
/// println!("Face threshold: {}", loader.config().face_match_threshold);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads `attendance.yaml` from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing
    /// - The file contains invalid YAML
    /// - A value is out of range
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let config_path = path.as_ref().join(CONFIG_FILE_NAME);
        let config = Self::load_yaml::<EngineConfig>(&config_path)?;
        Self::from_config(config)
    }

    /// Wraps an already-built configuration, validating it.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::config::{ConfigLoader, EngineConfig};
    ///
    /// let loader = ConfigLoader::from_config(EngineConfig::default())?;
    /// assert_eq!(loader.config().tolerance_minutes, 1);
    /// # Ok::<(), attendance_engine::error::EngineError>(())
    /// ```
    pub fn from_config(config: EngineConfig) -> EngineResult<Self> {
        Self::validate(&config)?;
        Ok(Self { config })
    }

    /// Loads seed data from a YAML file.
    pub fn load_seed<P: AsRef<Path>>(path: P) -> EngineResult<SeedData> {
        Self::load_yaml::<SeedData>(path.as_ref())
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn validate(config: &EngineConfig) -> EngineResult<()> {
        let threshold = config.face_match_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(EngineError::InvalidConfig {
                field: "face_match_threshold".to_string(),
                message: format!("must be in (0, 1], got {}", threshold),
            });
        }
        if config.tolerance_minutes < 0 {
            return Err(EngineError::InvalidConfig {
                field: "tolerance_minutes".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if config.no_show_grace_minutes < 0 {
            return Err(EngineError::InvalidConfig {
                field: "no_show_grace_minutes".to_string(),
                message: "must not be negative".to_string(),
            });
        }
        if config.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(EngineError::InvalidConfig {
                field: "utc_offset_minutes".to_string(),
                message: format!(
                    "must be within ±{} minutes, got {}",
                    MAX_UTC_OFFSET_MINUTES, config.utc_offset_minutes
                ),
            });
        }
        Ok(())
    }

    /// Returns the loaded configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_path() -> &'static str {
        "./config"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().face_match_threshold, 0.6);
        assert_eq!(loader.config().tolerance_minutes, 1);
        assert_eq!(loader.config().no_show_grace_minutes, 15);
        assert_eq!(loader.config().exception_cache_ttl_seconds, 30);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("attendance.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_load_seed_data() {
        let seed = ConfigLoader::load_seed("./config/seed.yaml").unwrap();
        assert!(!seed.agents.is_empty());
        assert_eq!(seed.agents.len(), seed.enrollments.len());
        assert!(!seed.schedule.is_empty());
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        let config = EngineConfig {
            face_match_threshold: 1.5,
            ..EngineConfig::default()
        };

        match ConfigLoader::from_config(config) {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "face_match_threshold");
            }
            _ => panic!("Expected InvalidConfig error"),
        }
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let config = EngineConfig {
            face_match_threshold: 0.0,
            ..EngineConfig::default()
        };
        assert!(ConfigLoader::from_config(config).is_err());
    }

    #[test]
    fn test_negative_grace_is_rejected() {
        let config = EngineConfig {
            no_show_grace_minutes: -5,
            ..EngineConfig::default()
        };
        assert!(ConfigLoader::from_config(config).is_err());
    }

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        let config = EngineConfig {
            utc_offset_minutes: 15 * 60,
            ..EngineConfig::default()
        };

        match ConfigLoader::from_config(config) {
            Err(EngineError::InvalidConfig { field, .. }) => {
                assert_eq!(field, "utc_offset_minutes");
            }
            _ => panic!("Expected InvalidConfig error"),
        }
    }
}
