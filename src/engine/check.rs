//! engine::check
//!
//! The read-only consistency check for one package.
//!
//! # Algorithm
//!
//! Short-circuits on the first failure:
//!
//! 1. Load the ledger; a malformed or empty ledger fails.
//! 2. With deep verification, check every entry against its content.
//! 3. Read the local manifest.
//! 4. The local version must be the ledger's current entry. Found further
//!    down is an ordering error; absent is an unregistered version.
//! 5. The current entry's scheme must match the local scheme.
//! 6. The local content id must match the current entry's content id.
//! 7. The package must be in the baseline.
//! 8. The baseline version must equal the current entry's version.
//!
//! On success a [`Confirmation`] is returned. The checker never writes.

use std::fmt;
use std::path::Path;

use super::content::{verify_ledger_content, ContentSource};
use super::errors::ConsistencyError;
use crate::core::baseline::Baseline;
use crate::core::ledger;
use crate::core::manifest;
use crate::core::types::{Oid, PackageName};
use crate::core::version::Version;

/// Everything the checker needs to know about one package.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    pub package: &'a PackageName,
    /// Directory holding the package's manifest.
    pub package_dir: &'a Path,
    pub ledger_path: &'a Path,
    /// Tree id of the package directory in the working tree.
    pub content_id: &'a Oid,
    pub baseline: &'a Baseline,
    /// Reported in baseline errors.
    pub baseline_path: &'a Path,
}

/// A package that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub content_id: Oid,
    pub package: PackageName,
    pub version: Version,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OK: {}\t{} -> {}", self.content_id, self.package, self.version)
    }
}

/// Check one package.
///
/// `content` enables deep verification of every ledger entry.
pub fn check_package(
    request: &CheckRequest<'_>,
    content: Option<&dyn ContentSource>,
) -> Result<Confirmation, ConsistencyError> {
    let package = request.package.as_str();
    let ledger_path = request.ledger_path;

    let ledger = ledger::load_path(ledger_path)
        .map_err(|e| ConsistencyError::from_ledger_load(package, e))?;

    if let Some(source) = content {
        verify_ledger_content(source, package, &ledger)?;
    }

    let (_, local) =
        manifest::load_local(request.package_dir).map_err(|source| {
            ConsistencyError::LocalManifest {
                package: package.to_string(),
                source,
            }
        })?;

    match ledger.position_of_version(&local.version) {
        Some(0) => {}
        Some(position) => {
            return Err(ConsistencyError::Ordering {
                package: package.to_string(),
                version: local.version,
                position,
                path: ledger_path.to_path_buf(),
            })
        }
        None => {
            return Err(ConsistencyError::UnregisteredVersion {
                package: package.to_string(),
                version: local.version,
                path: ledger_path.to_path_buf(),
            })
        }
    }

    let current = ledger.current();
    if current.schemed_version.scheme != local.scheme {
        return Err(ConsistencyError::SchemeConflict {
            package: package.to_string(),
            version: local.version,
            local: local.scheme,
            recorded: current.schemed_version.scheme,
            path: ledger_path.to_path_buf(),
        });
    }

    if &current.content_id != request.content_id {
        return Err(ConsistencyError::StaleHistory {
            package: package.to_string(),
            version: local.version,
            local: request.content_id.clone(),
            recorded: current.content_id.clone(),
            path: ledger_path.to_path_buf(),
        });
    }

    match request.baseline.get(package) {
        None => {
            return Err(ConsistencyError::MissingBaseline {
                package: package.to_string(),
                version: current.version().clone(),
                path: request.baseline_path.to_path_buf(),
            })
        }
        Some(found) if found != current.version() => {
            return Err(ConsistencyError::StaleBaseline {
                package: package.to_string(),
                expected: current.version().clone(),
                found: found.clone(),
                path: request.baseline_path.to_path_buf(),
            })
        }
        Some(_) => {}
    }

    Ok(Confirmation {
        content_id: current.content_id.clone(),
        package: request.package.clone(),
        version: current.version().clone(),
    })
}
