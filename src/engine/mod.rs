//! engine
//!
//! The consistency engine: checking and updating package history.
//!
//! # Architecture
//!
//! ```text
//! cli ──> batch ──┬──> check  ──> content (deep only)
//!                 └──> update
//!                         │
//!                core::{ledger, baseline, manifest}   git
//! ```
//!
//! - [`check`] - Read-only verification of one package
//! - [`update`] - Recording one package's declared version
//! - [`content`] - Deep verification against immutable history
//! - [`batch`] - Running either over many packages in parallel
//! - [`errors`] - The shared failure taxonomy
//!
//! # Invariants
//!
//! - The checker never writes
//! - The updater never applies a fix the caller did not ask for
//! - Each package is processed independently; only baseline writes are
//!   serialized
//!
//! # Example
//!
//! ```ignore
//! use portledger::engine::{batch, Context};
//!
//! let ctx = Context::new(root, config, Verbosity::Normal, None);
//! let packages = batch::list_packages(&ctx)?;
//! let report = batch::verify_packages(&ctx, &packages, false)?;
//! println!("{} failures", report.failures());
//! ```

pub mod batch;
pub mod check;
pub mod content;
pub mod errors;
pub mod update;

pub use batch::{BatchError, BatchOptions, BatchReport, PackageOutcome};
pub use check::{check_package, CheckRequest, Confirmation};
pub use content::{ContentSource, MemoryContentSource};
pub use errors::ConsistencyError;
pub use update::{update_package, BaselineChange, LedgerChange, UpdateOptions, UpdateReport};

use std::path::PathBuf;
use std::time::Duration;

use crate::core::config::Config;
use crate::core::paths::RegistryPaths;
use crate::ui::output::Verbosity;

/// Settings for one invocation, built once and passed down.
#[derive(Debug, Clone)]
pub struct Context {
    /// Registry layout.
    pub paths: RegistryPaths,
    /// Output level.
    pub verbosity: Verbosity,
    /// Worker threads for batch operations.
    pub jobs: usize,
    /// How long to wait for the baseline lock.
    pub lock_timeout: Duration,
    /// Packages verify always skips.
    pub exclude: Vec<String>,
}

impl Context {
    /// Resolve settings for the registry at `root`.
    ///
    /// `jobs` overrides the configured worker count.
    pub fn new(root: PathBuf, config: &Config, verbosity: Verbosity, jobs: Option<usize>) -> Self {
        let jobs = jobs
            .or(config.jobs())
            .unwrap_or_else(batch::default_jobs)
            .max(1);
        Self {
            paths: config.registry_paths(root),
            verbosity,
            jobs,
            lock_timeout: config.lock_timeout(),
            exclude: config.exclude().to_vec(),
        }
    }
}
