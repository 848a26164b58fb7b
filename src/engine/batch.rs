//! engine::batch
//!
//! Running the checker or the updater over many packages.
//!
//! # Architecture
//!
//! Packages are independent: each owns its ledger file, and the only shared
//! file (the baseline) is guarded by the baseline lock. A batch therefore
//! runs on a bounded pool of scoped threads that pull package indices from
//! a shared counter.
//!
//! Each worker opens its own [`Git`] handle, since a repository handle
//! cannot be shared between threads.
//!
//! # Stopping
//!
//! - A fatal error stops scheduling new packages.
//! - Without `keep_going`, any error stops scheduling new packages.
//! - Packages already running finish; committed writes are kept.
//!
//! Outcomes are returned in package-name order whatever the completion
//! order was.

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use thiserror::Error;

use super::check::{check_package, CheckRequest, Confirmation};
use super::content::ContentSource;
use super::errors::ConsistencyError;
use super::update::{update_package, UpdateOptions, UpdateReport};
use super::Context;
use crate::core::baseline::{BaselineError, BaselineStore};
use crate::core::ledger::LedgerStore;
use crate::core::manifest;
use crate::core::types::PackageName;
use crate::git::{Git, GitError};
use crate::ui::output;

/// Errors that prevent a batch from starting.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to list packages in {}", path.display())]
    ListPackages { path: PathBuf, source: io::Error },

    #[error("unknown package `{name}`: {} does not exist", path.display())]
    UnknownPackage { name: String, path: PathBuf },

    #[error(transparent)]
    Baseline(#[from] BaselineError),

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Scheduling knobs for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; at least one is used.
    pub jobs: usize,
    /// Continue past recoverable failures.
    pub keep_going: bool,
}

/// One package's result.
#[derive(Debug)]
pub struct PackageOutcome<T> {
    pub package: PackageName,
    pub result: Result<T, ConsistencyError>,
}

/// All results of a batch.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Outcomes in package order. Packages never started are absent.
    pub outcomes: Vec<PackageOutcome<T>>,
    /// Packages that were not started because the batch stopped early.
    pub skipped: usize,
}

impl<T> BatchReport<T> {
    /// Number of failed packages.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// True when every package ran and succeeded.
    pub fn is_success(&self) -> bool {
        self.skipped == 0 && self.failures() == 0
    }
}

/// Default worker count: the machine's available parallelism.
pub fn default_jobs() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Every package directory under the ports directory, sorted by name.
///
/// Hidden directories are skipped silently. Other directories whose names
/// are not valid package names are skipped with a warning.
pub fn list_packages(ctx: &Context) -> Result<Vec<PackageName>, BatchError> {
    let ports = ctx.paths.ports_dir();
    let entries = fs::read_dir(ports).map_err(|source| BatchError::ListPackages {
        path: ports.to_path_buf(),
        source,
    })?;

    let mut packages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BatchError::ListPackages {
            path: ports.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        match PackageName::new(name) {
            Ok(name) => packages.push(name),
            Err(err) => output::warn(
                format!("skipping {}: {}", path.display(), err),
                ctx.verbosity,
            ),
        }
    }
    packages.sort();
    Ok(packages)
}

/// Resolve an explicitly named package, which must have a directory.
pub fn resolve_package(ctx: &Context, name: &str) -> Result<PackageName, BatchError> {
    let package = PackageName::new(name).map_err(|_| BatchError::UnknownPackage {
        name: name.to_string(),
        path: ctx.paths.ports_dir().join(name),
    })?;
    let dir = ctx.paths.package_dir(&package);
    if !dir.is_dir() {
        return Err(BatchError::UnknownPackage {
            name: name.to_string(),
            path: dir,
        });
    }
    Ok(package)
}

/// Run `op` over `packages` on a pool of workers.
///
/// `init` builds per-worker state; the first init failure is returned.
pub fn run_batch<W, T, E, I, F>(
    packages: &[PackageName],
    options: BatchOptions,
    init: I,
    op: F,
) -> Result<BatchReport<T>, E>
where
    T: Send,
    E: Send,
    I: Fn() -> Result<W, E> + Sync,
    F: Fn(&W, &PackageName) -> Result<T, ConsistencyError> + Sync,
{
    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let workers = options.jobs.clamp(1, packages.len().max(1));

    let worker = || -> Result<Vec<(usize, PackageOutcome<T>)>, E> {
        let state = init()?;
        let mut done = Vec::new();
        while !stop.load(Ordering::SeqCst) {
            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(package) = packages.get(index) else {
                break;
            };

            let result = op(&state, package);
            if let Err(err) = &result {
                if err.is_fatal() || !options.keep_going {
                    stop.store(true, Ordering::SeqCst);
                }
            }
            done.push((
                index,
                PackageOutcome {
                    package: package.clone(),
                    result,
                },
            ));
        }
        Ok(done)
    };

    let per_worker: Vec<Result<Vec<(usize, PackageOutcome<T>)>, E>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers).map(|_| scope.spawn(&worker)).collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut outcomes = Vec::new();
    for result in per_worker {
        outcomes.extend(result?);
    }
    outcomes.sort_by_key(|(index, _)| *index);

    let skipped = packages.len() - outcomes.len();
    Ok(BatchReport {
        outcomes: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        skipped,
    })
}

/// Check every package in `packages`.
///
/// Verification always runs every package; `deep` enables content checks
/// against history.
pub fn verify_packages(
    ctx: &Context,
    packages: &[PackageName],
    deep: bool,
) -> Result<BatchReport<Confirmation>, BatchError> {
    let baseline_store = BaselineStore::new(&ctx.paths);
    let baseline = baseline_store.load()?;
    let baseline_path = baseline_store.path();
    let options = BatchOptions {
        jobs: ctx.jobs,
        keep_going: true,
    };

    output::debug(
        format!("verifying {} packages with {} workers", packages.len(), ctx.jobs),
        ctx.verbosity,
    );

    let report = run_batch(
        packages,
        options,
        || Git::open(&ctx.paths.root),
        |git, package| {
            let package_dir = ctx.paths.package_dir(package);
            let ledger_path = ctx.paths.ledger_path(package);
            let content_id =
                git.tree_oid_for_dir(&package_dir)
                    .map_err(|source| ConsistencyError::Git {
                        package: package.to_string(),
                        source,
                    })?;
            output::debug(format!("{package}: content id {content_id}"), ctx.verbosity);

            let request = CheckRequest {
                package,
                package_dir: &package_dir,
                ledger_path: &ledger_path,
                content_id: &content_id,
                baseline: &baseline,
                baseline_path: &baseline_path,
            };
            let content: Option<&dyn ContentSource> = if deep { Some(git) } else { None };
            check_package(&request, content)
        },
    )?;
    Ok(report)
}

/// Record the declared version of every package in `packages`.
pub fn add_versions(
    ctx: &Context,
    packages: &[PackageName],
    update: UpdateOptions,
    keep_going: bool,
) -> Result<BatchReport<UpdateReport>, BatchError> {
    let ledgers = LedgerStore::new(&ctx.paths);
    let baseline = BaselineStore::new(&ctx.paths).with_lock_timeout(ctx.lock_timeout);
    let options = BatchOptions {
        jobs: ctx.jobs,
        keep_going,
    };

    let report = run_batch(
        packages,
        options,
        || Git::open(&ctx.paths.root),
        |git, package| {
            let package_dir = ctx.paths.package_dir(package);
            let (source, desired) = manifest::load_local(&package_dir).map_err(|source| {
                ConsistencyError::LocalManifest {
                    package: package.to_string(),
                    source,
                }
            })?;
            let content_id =
                git.tree_oid_for_dir(&package_dir)
                    .map_err(|source| ConsistencyError::Git {
                        package: package.to_string(),
                        source,
                    })?;
            output::debug(
                format!("{package}: {desired} from {source}, content id {content_id}"),
                ctx.verbosity,
            );

            update_package(package, &desired, &content_id, &ledgers, &baseline, update)
        },
    )?;
    Ok(report)
}
