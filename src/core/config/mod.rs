//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! portledger has two configuration scopes:
//! - **Global**: User-level settings
//! - **Registry**: Settings stored in the registry checkout
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Registry config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$PORTLEDGER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/portledger/config.toml`
//! 3. `~/.portledger/config.toml`
//!
//! # Registry Config Location
//!
//! `<root>/.portledger/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use portledger::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/registry"))).unwrap();
//! let config = result.config;
//!
//! println!("Ports: {}", config.ports_dir());
//! println!("Excluded: {:?}", config.exclude());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RegistryConfig};

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::ops::lock::DEFAULT_LOCK_TIMEOUT;
use crate::core::paths::{RegistryPaths, DEFAULT_PORTS_DIR, DEFAULT_VERSIONS_DIR};

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV_VAR: &str = "PORTLEDGER_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply defaults; the registry scope and the global scope never
/// share a key, so no key needs merging.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Registry configuration (if one was found)
    pub registry: Option<RegistryConfig>,
    global_path: Option<PathBuf>,
    registry_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `root` is provided, also loads the registry config under it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(root: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let candidates = global_candidates(
            std::env::var_os(CONFIG_ENV_VAR),
            std::env::var_os("XDG_CONFIG_HOME"),
            dirs::home_dir(),
        );
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            let explicit = PathBuf::from(explicit);
            if !explicit.exists() {
                warnings.push(ConfigWarning {
                    message: format!(
                        "{} points to a missing file; falling back to default locations",
                        CONFIG_ENV_VAR
                    ),
                    path: explicit,
                });
            }
        }

        let global_path = candidates.into_iter().find(|p| p.exists());
        Self::load_from(global_path.as_deref(), root).map(|config| ConfigLoadResult {
            config,
            warnings,
        })
    }

    /// Load from an explicit global file (if any) and a registry root.
    pub fn load_from(global: Option<&Path>, root: Option<&Path>) -> Result<Config, ConfigError> {
        let global_config = match global {
            Some(path) => read_toml::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let registry_path = root
            .map(RegistryPaths::config_path_for)
            .filter(|p| p.exists());
        let registry = match &registry_path {
            Some(path) => Some(read_toml::<RegistryConfig>(path)?),
            None => None,
        };

        global_config.validate()?;
        if let Some(ref r) = registry {
            r.validate()?;
        }

        Ok(Config {
            global: global_config,
            registry,
            global_path: global.map(Path::to_path_buf),
            registry_path,
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Whether per-package success lines are shown by default.
    ///
    /// Defaults to `false`.
    pub fn verbose(&self) -> bool {
        self.global.verbose.unwrap_or(false)
    }

    /// Configured worker count, if any.
    pub fn jobs(&self) -> Option<usize> {
        self.global.jobs
    }

    /// Directory of package directories, relative to the root.
    ///
    /// Defaults to `ports`.
    pub fn ports_dir(&self) -> &str {
        self.registry
            .as_ref()
            .and_then(|r| r.ports_dir.as_deref())
            .unwrap_or(DEFAULT_PORTS_DIR)
    }

    /// Directory of ledgers and the baseline, relative to the root.
    ///
    /// Defaults to `versions`.
    pub fn versions_dir(&self) -> &str {
        self.registry
            .as_ref()
            .and_then(|r| r.versions_dir.as_deref())
            .unwrap_or(DEFAULT_VERSIONS_DIR)
    }

    /// Packages verify always skips.
    pub fn exclude(&self) -> &[String] {
        self.registry
            .as_ref()
            .and_then(|r| r.exclude.as_deref())
            .unwrap_or(&[])
    }

    /// How long to wait for the baseline lock.
    pub fn lock_timeout(&self) -> Duration {
        self.registry
            .as_ref()
            .and_then(|r| r.lock_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LOCK_TIMEOUT)
    }

    /// Registry paths for `root` using the configured directories.
    pub fn registry_paths(&self, root: PathBuf) -> RegistryPaths {
        RegistryPaths::with_dirs(
            root,
            Path::new(self.ports_dir()),
            Path::new(self.versions_dir()),
        )
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded registry config file.
    pub fn registry_config_loaded_from(&self) -> Option<&Path> {
        self.registry_path.as_deref()
    }
}

/// Global config locations in search order.
fn global_candidates(
    explicit: Option<OsString>,
    xdg_home: Option<OsString>,
    home: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(PathBuf::from(path));
    }
    if let Some(xdg) = xdg_home {
        candidates.push(PathBuf::from(xdg).join("portledger/config.toml"));
    }
    if let Some(home) = home {
        candidates.push(home.join(".portledger/config.toml"));
    }
    candidates
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_registry_toml(root: &Path, contents: &str) {
        let path = RegistryPaths::config_path_for(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_without_files() {
        let config = Config::load_from(None, None).unwrap();

        assert!(!config.verbose());
        assert_eq!(config.jobs(), None);
        assert_eq!(config.ports_dir(), "ports");
        assert_eq!(config.versions_dir(), "versions");
        assert!(config.exclude().is_empty());
        assert_eq!(config.lock_timeout(), DEFAULT_LOCK_TIMEOUT);
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn global_file_is_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "verbose = true\njobs = 3\n").unwrap();

        let config = Config::load_from(Some(&path), None).unwrap();
        assert!(config.verbose());
        assert_eq!(config.jobs(), Some(3));
        assert_eq!(config.global_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn registry_file_is_read() {
        let temp = TempDir::new().unwrap();
        write_registry_toml(
            temp.path(),
            "ports_dir = \"recipes\"\nexclude = [\"zlib\"]\nlock_timeout_secs = 2\n",
        );

        let config = Config::load_from(None, Some(temp.path())).unwrap();
        assert_eq!(config.ports_dir(), "recipes");
        assert_eq!(config.exclude(), ["zlib".to_string()]);
        assert_eq!(config.lock_timeout(), Duration::from_secs(2));

        let paths = config.registry_paths(temp.path().to_path_buf());
        assert_eq!(paths.ports_dir(), temp.path().join("recipes"));
        assert_eq!(paths.versions_dir(), temp.path().join("versions"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        write_registry_toml(temp.path(), "trunk = \"main\"\n");

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        write_registry_toml(temp.path(), "exclude = [\"Not A Port\"]\n");

        let result = Config::load_from(None, Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn global_search_order() {
        let candidates = global_candidates(
            Some(OsString::from("/explicit.toml")),
            Some(OsString::from("/xdg")),
            Some(PathBuf::from("/home/me")),
        );
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/explicit.toml"),
                PathBuf::from("/xdg/portledger/config.toml"),
                PathBuf::from("/home/me/.portledger/config.toml"),
            ]
        );

        assert_eq!(
            global_candidates(None, None, Some(PathBuf::from("/home/me"))),
            vec![PathBuf::from("/home/me/.portledger/config.toml")]
        );
    }
}
