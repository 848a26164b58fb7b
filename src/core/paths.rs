//! core::paths
//!
//! Centralized path routing for the registry layout.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   ports/<pkg>/                 package directory (manifest + files)
//!   versions/<c>-/<pkg>.json     ledger, sharded by first character
//!   versions/baseline.json       baseline
//!   versions/baseline.json.lock  lock guarding baseline rewrites
//!   .portledger/config.toml      registry configuration
//! ```
//!
//! **Hard rule:** no other module joins registry paths by hand. Directory
//! names that are configurable come from [`RegistryPaths::with_dirs`].
//!
//! # Example
//!
//! ```
//! use portledger::core::paths::RegistryPaths;
//! use portledger::core::types::PackageName;
//! use std::path::PathBuf;
//!
//! let paths = RegistryPaths::new(PathBuf::from("/registry"));
//! let zlib = PackageName::new("zlib").unwrap();
//!
//! assert_eq!(paths.ledger_path(&zlib), PathBuf::from("/registry/versions/z-/zlib.json"));
//! assert_eq!(paths.package_dir(&zlib), PathBuf::from("/registry/ports/zlib"));
//! assert_eq!(paths.baseline_path(), PathBuf::from("/registry/versions/baseline.json"));
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::PackageName;

/// Default directory holding one subdirectory per package.
pub const DEFAULT_PORTS_DIR: &str = "ports";

/// Default directory holding ledgers and the baseline.
pub const DEFAULT_VERSIONS_DIR: &str = "versions";

/// File name of the baseline inside the versions directory.
pub const BASELINE_FILE: &str = "baseline.json";

/// Centralized path routing for registry storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryPaths {
    /// Registry root (normally the git work tree root).
    pub root: PathBuf,
    ports_dir: PathBuf,
    versions_dir: PathBuf,
}

impl RegistryPaths {
    /// Paths for a registry using the default directory names.
    pub fn new(root: PathBuf) -> Self {
        Self::with_dirs(root, Path::new(DEFAULT_PORTS_DIR), Path::new(DEFAULT_VERSIONS_DIR))
    }

    /// Paths for a registry with configured directory names.
    ///
    /// Relative directories are resolved against `root`.
    pub fn with_dirs(root: PathBuf, ports_dir: &Path, versions_dir: &Path) -> Self {
        let ports_dir = root.join(ports_dir);
        let versions_dir = root.join(versions_dir);
        Self {
            root,
            ports_dir,
            versions_dir,
        }
    }

    /// Directory that contains every package directory.
    pub fn ports_dir(&self) -> &Path {
        &self.ports_dir
    }

    /// Directory that contains the ledgers and the baseline.
    pub fn versions_dir(&self) -> &Path {
        &self.versions_dir
    }

    /// Directory of one package.
    pub fn package_dir(&self, name: &PackageName) -> PathBuf {
        self.ports_dir.join(name.as_str())
    }

    /// Ledger file of one package.
    pub fn ledger_path(&self, name: &PackageName) -> PathBuf {
        self.versions_dir
            .join(format!("{}-", name.shard()))
            .join(format!("{}.json", name))
    }

    /// The shared baseline file.
    pub fn baseline_path(&self) -> PathBuf {
        self.versions_dir.join(BASELINE_FILE)
    }

    /// Lock file guarding baseline rewrites.
    pub fn baseline_lock_path(&self) -> PathBuf {
        self.versions_dir.join(format!("{}.lock", BASELINE_FILE))
    }

    /// Registry-scoped configuration file.
    pub fn config_path(&self) -> PathBuf {
        Self::config_path_for(&self.root)
    }

    /// Registry-scoped configuration file for a root, before paths are built.
    pub fn config_path_for(root: &Path) -> PathBuf {
        root.join(".portledger").join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    #[test]
    fn ledger_is_sharded_by_first_char() {
        let paths = RegistryPaths::new(PathBuf::from("/r"));
        assert_eq!(
            paths.ledger_path(&name("7zip")),
            PathBuf::from("/r/versions/7-/7zip.json")
        );
        assert_eq!(
            paths.ledger_path(&name("abseil")),
            PathBuf::from("/r/versions/a-/abseil.json")
        );
    }

    #[test]
    fn configured_dirs_are_relative_to_root() {
        let paths = RegistryPaths::with_dirs(
            PathBuf::from("/r"),
            Path::new("recipes"),
            Path::new("db/versions"),
        );
        assert_eq!(paths.package_dir(&name("zlib")), PathBuf::from("/r/recipes/zlib"));
        assert_eq!(
            paths.baseline_path(),
            PathBuf::from("/r/db/versions/baseline.json")
        );
        assert_eq!(
            paths.baseline_lock_path(),
            PathBuf::from("/r/db/versions/baseline.json.lock")
        );
    }

    #[test]
    fn config_path_is_under_root() {
        let paths = RegistryPaths::new(PathBuf::from("/r"));
        assert_eq!(paths.config_path(), PathBuf::from("/r/.portledger/config.toml"));
    }
}
