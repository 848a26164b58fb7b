//! core::baseline::store
//!
//! File-backed baseline storage.
//!
//! # Architecture
//!
//! The baseline is a single file shared by every package. Reads are
//! lock-free. [`BaselineStore::upsert`] is the only mutation path used by
//! the updater: it takes the [`BaselineLock`], re-reads the file, applies
//! the change, and writes atomically, so concurrent upserts for different
//! packages never overwrite each other.
//!
//! A missing baseline file reads as an empty baseline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::schema::{parse_baseline, serialize_baseline, Baseline, BaselineSchemaError};
use crate::core::atomic::{self, StagedWrite};
use crate::core::ops::lock::{BaselineLock, LockError, DEFAULT_LOCK_TIMEOUT};
use crate::core::paths::RegistryPaths;
use crate::core::version::Version;

/// Errors from baseline storage operations.
#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        source: BaselineSchemaError,
    },

    #[error("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize {}", path.display())]
    Serialize {
        path: PathBuf,
        source: BaselineSchemaError,
    },

    #[error("baseline lock")]
    Lock(#[from] LockError),
}

/// Baseline store for one registry.
#[derive(Debug, Clone, Copy)]
pub struct BaselineStore<'a> {
    paths: &'a RegistryPaths,
    lock_timeout: Duration,
}

impl<'a> BaselineStore<'a> {
    pub fn new(paths: &'a RegistryPaths) -> Self {
        Self {
            paths,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override how long [`upsert`](Self::upsert) waits for the lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The baseline file.
    pub fn path(&self) -> PathBuf {
        self.paths.baseline_path()
    }

    /// Load the baseline. A missing file is an empty baseline.
    pub fn load(&self) -> Result<Baseline, BaselineError> {
        load_path(&self.path())
    }

    /// Write the baseline atomically.
    pub fn save(&self, baseline: &Baseline) -> Result<(), BaselineError> {
        let path = self.path();
        self.stage(baseline)?
            .commit()
            .map_err(|source| BaselineError::Write { path, source })
    }

    /// Write the baseline to its temporary sibling without replacing the file.
    pub fn stage(&self, baseline: &Baseline) -> Result<StagedWrite, BaselineError> {
        let path = self.path();
        let json = serialize_baseline(baseline).map_err(|source| BaselineError::Serialize {
            path: path.clone(),
            source,
        })?;
        atomic::stage(&path, json.as_bytes()).map_err(|source| BaselineError::Write { path, source })
    }

    /// Set a package's baseline version under the baseline lock.
    ///
    /// Returns `Ok(false)` without writing when the recorded version is
    /// already equal.
    pub fn upsert(&self, package: &str, version: &Version) -> Result<bool, BaselineError> {
        let _lock = BaselineLock::acquire(self.paths, self.lock_timeout)?;

        let mut baseline = self.load()?;
        if !baseline.set(package, version.clone()) {
            return Ok(false);
        }
        self.save(&baseline)?;
        Ok(true)
    }
}

/// Load a baseline from an explicit file path.
pub fn load_path(path: &Path) -> Result<Baseline, BaselineError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Baseline::new()),
        Err(source) => {
            return Err(BaselineError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_baseline(&json).map_err(|source| BaselineError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
