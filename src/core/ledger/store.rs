//! core::ledger::store
//!
//! File-backed ledger storage.
//!
//! # Architecture
//!
//! One JSON file per package under the versions directory (see
//! [`RegistryPaths::ledger_path`]). Reads are plain file reads; writes go
//! through [`crate::core::atomic`] so the real file name only ever holds a
//! complete ledger.
//!
//! Ledger writes need no cross-package coordination: each package owns
//! its file.
//!
//! # Example
//!
//! ```ignore
//! use portledger::core::ledger::LedgerStore;
//!
//! let store = LedgerStore::new(&paths);
//! let mut ledger = store.load(&name)?;
//! ledger.prepend(entry);
//! store.save(&name, &ledger)?;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{parse_entries, serialize_ledger, Ledger, SchemaError};
use crate::core::atomic::{self, StagedWrite};
use crate::core::paths::RegistryPaths;
use crate::core::types::PackageName;

/// Errors from ledger storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No ledger file exists for the package.
    #[error("ledger file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The file is not a valid ledger.
    #[error("failed to parse {}", path.display())]
    Parse { path: PathBuf, source: SchemaError },

    /// The file parsed but holds no versions.
    #[error("{} contains no versions", path.display())]
    Empty { path: PathBuf },

    /// The file could not be written.
    #[error("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The ledger could not be serialized.
    #[error("failed to serialize ledger for {}", path.display())]
    Serialize { path: PathBuf, source: SchemaError },
}

impl StoreError {
    /// The file the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            StoreError::NotFound { path }
            | StoreError::Read { path, .. }
            | StoreError::Parse { path, .. }
            | StoreError::Empty { path }
            | StoreError::Write { path, .. }
            | StoreError::Serialize { path, .. } => path,
        }
    }
}

/// Ledger store rooted at a registry's versions directory.
#[derive(Debug, Clone, Copy)]
pub struct LedgerStore<'a> {
    paths: &'a RegistryPaths,
}

impl<'a> LedgerStore<'a> {
    pub fn new(paths: &'a RegistryPaths) -> Self {
        Self { paths }
    }

    /// The ledger file for a package.
    pub fn path(&self, name: &PackageName) -> PathBuf {
        self.paths.ledger_path(name)
    }

    /// Whether a ledger file exists for the package.
    pub fn exists(&self, name: &PackageName) -> bool {
        self.path(name).is_file()
    }

    /// Load a package's ledger.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if there is no ledger file
    /// - [`StoreError::Parse`] if the file is malformed
    /// - [`StoreError::Empty`] if the file holds zero entries
    pub fn load(&self, name: &PackageName) -> Result<Ledger, StoreError> {
        load_path(&self.path(name))
    }

    /// Write a package's ledger atomically, newest first.
    pub fn save(&self, name: &PackageName, ledger: &Ledger) -> Result<(), StoreError> {
        let path = self.path(name);
        self.stage(name, ledger)?
            .commit()
            .map_err(|source| StoreError::Write { path, source })
    }

    /// Write the ledger to its temporary sibling without replacing the file.
    pub fn stage(&self, name: &PackageName, ledger: &Ledger) -> Result<StagedWrite, StoreError> {
        let path = self.path(name);
        let json = serialize_ledger(ledger).map_err(|source| StoreError::Serialize {
            path: path.clone(),
            source,
        })?;
        atomic::stage(&path, json.as_bytes()).map_err(|source| StoreError::Write { path, source })
    }
}

/// Load a ledger from an explicit file path.
pub fn load_path(path: &Path) -> Result<Ledger, StoreError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let entries = parse_entries(&json).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ledger::from_entries(entries).ok_or_else(|| StoreError::Empty {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Oid;
    use crate::core::version::{LedgerEntry, SchemedVersion, VersionScheme};
    use tempfile::TempDir;

    fn setup() -> (TempDir, RegistryPaths) {
        let dir = TempDir::new().unwrap();
        let paths = RegistryPaths::new(dir.path().to_path_buf());
        (dir, paths)
    }

    fn name() -> PackageName {
        PackageName::new("zlib").unwrap()
    }

    fn entry(text: &str, c: char) -> LedgerEntry {
        LedgerEntry::new(
            SchemedVersion::parse(VersionScheme::Relaxed, text, 0).unwrap(),
            Oid::new(c.to_string().repeat(40)).unwrap(),
        )
    }

    #[test]
    fn load_missing_is_not_found() {
        let (_dir, paths) = setup();
        let store = LedgerStore::new(&paths);

        assert!(!store.exists(&name()));
        assert!(matches!(store.load(&name()), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn save_then_load() {
        let (_dir, paths) = setup();
        let store = LedgerStore::new(&paths);
        let mut ledger = Ledger::new(entry("1.0", 'a'));
        ledger.prepend(entry("1.1", 'b'));

        store.save(&name(), &ledger).unwrap();

        assert!(store.exists(&name()));
        assert_eq!(store.load(&name()).unwrap(), ledger);
    }

    #[test]
    fn empty_file_is_empty_error() {
        let (_dir, paths) = setup();
        let store = LedgerStore::new(&paths);
        let path = store.path(&name());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"versions":[]}"#).unwrap();

        let err = store.load(&name()).unwrap_err();
        assert!(matches!(err, StoreError::Empty { .. }));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let (_dir, paths) = setup();
        let store = LedgerStore::new(&paths);
        let path = store.path(&name());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(matches!(store.load(&name()), Err(StoreError::Parse { .. })));
    }
}
