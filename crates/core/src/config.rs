//! Catalog configuration via `tsid.toml`
//!
//! The two limits below are deployment policy rather than format: the field
//! ceiling bounds per-metric schema growth and the suggestion cap bounds the
//! size of UI-facing prefix queries. A catalog directory may carry a
//! `tsid.toml`; missing keys fall back to the defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the catalog data directory.
pub const CONFIG_FILE_NAME: &str = "tsid.toml";

/// Catalog configuration loaded from `tsid.toml`.
///
/// # Example
///
/// ```toml
/// # Highest field ID a single metric may allocate
/// max_fields_per_metric = 1024
///
/// # Upper bound for suggest_metrics / suggest_tag_keys results
/// max_suggestions = 10000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Highest field ID a metric may be given (default: 1024).
    #[serde(default = "default_max_fields_per_metric")]
    pub max_fields_per_metric: u16,
    /// Upper bound on suggestion results, applied after the caller's limit (default: 10000).
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_fields_per_metric() -> u16 {
    1024
}

fn default_max_suggestions() -> usize {
    10_000
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_fields_per_metric: default_max_fields_per_metric(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl CatalogConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-metric field ceiling (builder pattern).
    pub fn with_max_fields_per_metric(mut self, max: u16) -> Self {
        self.max_fields_per_metric = max;
        self
    }

    /// Set the suggestion cap (builder pattern).
    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_fields_per_metric == 0 {
            return Err(Error::invalid_input(
                "max_fields_per_metric must be at least 1",
            ));
        }
        if self.max_suggestions == 0 {
            return Err(Error::invalid_input("max_suggestions must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CatalogConfig = toml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `tsid.toml` from a directory, or defaults when the file is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
