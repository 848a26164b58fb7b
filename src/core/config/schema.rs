//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$PORTLEDGER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/portledger/config.toml`
//! 3. `~/.portledger/config.toml` (canonical write location)
//!
//! # Registry Config
//!
//! Located at `<root>/.portledger/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing (e.g., excluded packages must be
//! valid package names, directories must be relative).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::PackageName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// verbose = false
/// jobs = 8
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Print per-package success lines by default
    pub verbose: Option<bool>,

    /// Worker threads for batch operations
    pub jobs: Option<usize>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Registry configuration.
///
/// # Example
///
/// ```toml
/// ports_dir = "ports"
/// versions_dir = "versions"
/// exclude = ["broken-port"]
/// lock_timeout_secs = 10
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Directory holding package directories, relative to the root
    pub ports_dir: Option<String>,

    /// Directory holding ledgers and the baseline, relative to the root
    pub versions_dir: Option<String>,

    /// Packages always skipped by verify
    pub exclude: Option<Vec<String>>,

    /// Seconds to wait for the baseline lock
    pub lock_timeout_secs: Option<u64>,
}

impl RegistryConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, dir) in [("ports_dir", &self.ports_dir), ("versions_dir", &self.versions_dir)] {
            if let Some(dir) = dir {
                if dir.is_empty() {
                    return Err(ConfigError::InvalidValue(format!("{key} cannot be empty")));
                }
                if Path::new(dir).is_absolute() {
                    return Err(ConfigError::InvalidValue(format!(
                        "{key} must be relative to the registry root, got '{dir}'"
                    )));
                }
            }
        }

        if let Some(exclude) = &self.exclude {
            for name in exclude {
                PackageName::new(name.as_str()).map_err(|e| {
                    ConfigError::InvalidValue(format!("invalid excluded package: {}", e))
                })?;
            }
        }

        if self.lock_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "lock_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
