//! core::ops::lock
//!
//! Exclusive lock around baseline rewrites.
//!
//! # Architecture
//!
//! The baseline is one file shared by every package. Two updaters that
//! both read it, insert their own package, and write it back would lose one
//! of the two inserts. The lock serializes the whole load-mutate-save
//! sequence across threads and processes.
//!
//! The lock is an OS-level exclusive lock (`fs2`) on a sibling file,
//! `baseline.json.lock`. Acquisition blocks, polling until a timeout.
//!
//! # Invariants
//!
//! - The baseline must be re-read after the lock is acquired
//! - Lock is automatically released on drop (RAII pattern)
//! - Ledger files are never locked; each package owns its own file
//!
//! # Example
//!
//! ```ignore
//! use portledger::core::ops::lock::{BaselineLock, DEFAULT_LOCK_TIMEOUT};
//!
//! let lock = BaselineLock::acquire(&paths, DEFAULT_LOCK_TIMEOUT)?;
//! let mut baseline = store.load()?;   // fresh read under the lock
//! baseline.set(name, version);
//! store.save(&baseline)?;
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::RegistryPaths;

/// Default timeout for lock acquisition (10 seconds).
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Polling interval when waiting for the lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder kept the lock past the timeout.
    #[error("timed out after {timeout:?} waiting for {}", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the baseline file.
///
/// Released when dropped, even if the holder panics.
#[derive(Debug)]
pub struct BaselineLock {
    path: PathBuf,
    file: Option<File>,
}

impl BaselineLock {
    /// Acquire the lock, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// - [`LockError::Timeout`] if the lock is still held when the timeout expires
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] for any other OS error
    pub fn acquire(paths: &RegistryPaths, timeout: Duration) -> Result<Self, LockError> {
        let path = paths.baseline_lock_path();
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(lock) = Self::try_acquire_at(&path)? {
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path, timeout });
            }
            thread::sleep(LOCK_POLL_INTERVAL);
        }
    }

    /// Try to acquire the lock without blocking.
    ///
    /// Returns `Ok(None)` if someone else holds it.
    pub fn try_acquire(paths: &RegistryPaths) -> Result<Option<Self>, LockError> {
        Self::try_acquire_at(&paths.baseline_lock_path())
    }

    fn try_acquire_at(path: &Path) -> Result<Option<Self>, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                path: path.to_path_buf(),
                file: Some(file),
            })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for BaselineLock {
    fn drop(&mut self) {
        // Best-effort release on drop - ignore errors since we're dropping
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
