//! engine::update
//!
//! Recording a package's declared version in its ledger and the baseline.
//!
//! # Algorithm
//!
//! 1. No ledger file: create one holding the new entry.
//! 2. Load the ledger. A corrupt ledger is fatal.
//! 3. An entry already pins the current content id:
//!    - same version: nothing to record
//!    - other version: uncommitted change, refused even with `overwrite`
//! 4. An entry already records the desired version with other content:
//!    replaced in place with `overwrite`, refused without it.
//!    Otherwise the new entry is prepended.
//! 5. Save the ledger.
//! 6. Upsert the baseline under the baseline lock.
//!
//! A ledger no-op still reaches step 6, so a missing baseline entry is
//! repaired without touching the ledger. Running the updater twice with no
//! change in between writes nothing the second time.

use super::errors::ConsistencyError;
use crate::core::baseline::BaselineStore;
use crate::core::ledger::{Ledger, LedgerStore};
use crate::core::types::{Oid, PackageName};
use crate::core::version::{LedgerEntry, SchemedVersion, Version};

/// Caller choices for one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Allow replacing an existing entry for the same version.
    pub overwrite: bool,
}

/// What happened to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    /// The ledger file did not exist and was created.
    Created,
    /// The version and content were already recorded.
    Unchanged,
    /// A new current entry was added.
    Prepended,
    /// The entry at `position` was replaced in place.
    Overwritten { position: usize },
}

impl LedgerChange {
    pub fn is_write(self) -> bool {
        !matches!(self, LedgerChange::Unchanged)
    }
}

/// What happened to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineChange {
    Unchanged,
    Updated,
}

/// Outcome of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub package: PackageName,
    pub version: Version,
    pub ledger: LedgerChange,
    pub baseline: BaselineChange,
}

/// Record `desired` with `content_id` for `package`.
pub fn update_package(
    package: &PackageName,
    desired: &SchemedVersion,
    content_id: &Oid,
    ledgers: &LedgerStore<'_>,
    baseline: &BaselineStore<'_>,
    options: UpdateOptions,
) -> Result<UpdateReport, ConsistencyError> {
    let name = package.as_str();
    let entry = LedgerEntry::new(desired.clone(), content_id.clone());

    let ledger_change = if ledgers.exists(package) {
        let mut ledger = ledgers
            .load(package)
            .map_err(|e| ConsistencyError::from_ledger_load(name, e))?;

        let change = plan_change(package, &mut ledger, entry, ledgers, options)?;
        if change.is_write() {
            save(ledgers, package, &ledger)?;
        }
        change
    } else {
        save(ledgers, package, &Ledger::new(entry))?;
        LedgerChange::Created
    };

    let baseline_change = match baseline.upsert(name, &desired.version) {
        Ok(true) => BaselineChange::Updated,
        Ok(false) => BaselineChange::Unchanged,
        Err(source) => {
            return Err(ConsistencyError::Baseline {
                package: name.to_string(),
                source,
            })
        }
    };

    Ok(UpdateReport {
        package: package.clone(),
        version: desired.version.clone(),
        ledger: ledger_change,
        baseline: baseline_change,
    })
}

/// Apply the entry to an in-memory ledger and say what changed.
fn plan_change(
    package: &PackageName,
    ledger: &mut Ledger,
    entry: LedgerEntry,
    ledgers: &LedgerStore<'_>,
    options: UpdateOptions,
) -> Result<LedgerChange, ConsistencyError> {
    if let Some(position) = ledger.position_of_content(&entry.content_id) {
        let recorded = ledger.entries()[position].version();
        if recorded == entry.version() {
            return Ok(LedgerChange::Unchanged);
        }
        return Err(ConsistencyError::UncommittedChange {
            package: package.to_string(),
            version: entry.version().clone(),
            recorded: recorded.clone(),
            content_id: entry.content_id,
            path: ledgers.path(package),
        });
    }

    match ledger.position_of_version(entry.version()) {
        Some(position) if options.overwrite => {
            ledger.replace(position, entry);
            Ok(LedgerChange::Overwritten { position })
        }
        Some(_) => Err(ConsistencyError::MissingVersionBump {
            package: package.to_string(),
            version: entry.version().clone(),
            path: ledgers.path(package),
        }),
        None => {
            ledger.prepend(entry);
            Ok(LedgerChange::Prepended)
        }
    }
}

fn save(
    ledgers: &LedgerStore<'_>,
    package: &PackageName,
    ledger: &Ledger,
) -> Result<(), ConsistencyError> {
    ledgers
        .save(package, ledger)
        .map_err(|source| ConsistencyError::LedgerWrite {
            package: package.to_string(),
            source,
        })
}
