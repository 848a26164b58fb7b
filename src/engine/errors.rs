//! engine::errors
//!
//! The failure taxonomy of the checker and the updater.
//!
//! Every variant names the package and the file involved, and its message
//! ends with the command that would fix it. The engine never applies a fix
//! itself.
//!
//! # Fatal vs recoverable
//!
//! [`ConsistencyError::is_fatal`] separates pre-existing corruption (an
//! unreadable ledger or baseline, I/O and lock failures) from conflicts a
//! contributor introduced. A batch run with `keep_going` continues past
//! recoverable errors only.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::baseline::BaselineError;
use crate::core::ledger::StoreError;
use crate::core::manifest::ManifestError;
use crate::core::types::Oid;
use crate::core::version::{SchemedVersion, Version, VersionScheme};
use crate::git::GitError;

/// A consistency failure for one package.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    /// The ledger file exists but cannot be read or parsed.
    #[error("{package}: ledger {} is corrupt; restore it from version control", source.path().display())]
    LedgerParse { package: String, source: StoreError },

    /// The ledger file parsed but holds no versions.
    #[error("{package}: {} contains no versions\nRestore it from version control or delete it and run `portledger add-version {package}`.", path.display())]
    EmptyLedger { package: String, path: PathBuf },

    /// The ledger could not be written.
    #[error("{package}: failed to update the ledger")]
    LedgerWrite { package: String, source: StoreError },

    /// No ledger file exists for the package.
    #[error("{package}: no ledger at {}\nRun `portledger add-version {package}` to create it.", path.display())]
    MissingLedger { package: String, path: PathBuf },

    /// The local version is in the ledger but is not the current entry.
    #[error("{package}: version {version} is recorded in {} at position {position} but is not the current version\nHistory was not updated in order. Bump the version in the manifest and run `portledger add-version {package}`.", path.display())]
    Ordering {
        package: String,
        version: Version,
        position: usize,
        path: PathBuf,
    },

    /// The local version is not in the ledger at all.
    #[error("{package}: version {version} is not recorded in {}\nRun `portledger add-version {package}` to record it.", path.display())]
    UnregisteredVersion {
        package: String,
        version: Version,
        path: PathBuf,
    },

    /// The local version text is recorded under a different scheme.
    #[error("{package}: version {version} is declared as `{local}` but recorded in {} as `{recorded}`\nVersion text must be unique across schemes. Run `portledger add-version {package} --overwrite-version` to replace the recorded entry.", path.display())]
    SchemeConflict {
        package: String,
        version: Version,
        local: VersionScheme,
        recorded: VersionScheme,
        path: PathBuf,
    },

    /// The package files changed without a new ledger entry.
    #[error("{package}: files for version {version} have content id {local} but {} records {recorded}\nBump the version and run `portledger add-version {package}`, or run `portledger add-version {package} --overwrite-version` to replace the recorded content.", path.display())]
    StaleHistory {
        package: String,
        version: Version,
        local: Oid,
        recorded: Oid,
        path: PathBuf,
    },

    /// The package has no baseline entry.
    #[error("{package}: missing from baseline {} (expected {version})\nRun `portledger add-version {package}`.", path.display())]
    MissingBaseline {
        package: String,
        version: Version,
        path: PathBuf,
    },

    /// The baseline endorses a different version than the ledger's current one.
    #[error("{package}: baseline {} has {found} but the current version is {expected}\nRun `portledger add-version {package}`.", path.display())]
    StaleBaseline {
        package: String,
        expected: Version,
        found: Version,
        path: PathBuf,
    },

    /// The package files match an entry recorded under another version.
    #[error("{package}: files with content id {content_id} are already recorded in {} as version {recorded}, not {version}\nThe version was changed without changing the package. Commit the package changes before bumping the version.", path.display())]
    UncommittedChange {
        package: String,
        version: Version,
        recorded: Version,
        content_id: Oid,
        path: PathBuf,
    },

    /// An existing version would be republished with different files.
    #[error("{package}: version {version} is already recorded in {} with different files\nIncrement the version or port-version, or run `portledger add-version {package} --overwrite-version` to replace it.", path.display())]
    MissingVersionBump {
        package: String,
        version: Version,
        path: PathBuf,
    },

    /// Historical content declares a different version than recorded.
    #[error("{package}: content {content_id} declares {found} but the ledger records {recorded}\nRun `portledger add-version {package} --overwrite-version` from a checkout whose files match the recorded version.")]
    ContentMismatch {
        package: String,
        content_id: Oid,
        recorded: SchemedVersion,
        found: SchemedVersion,
    },

    /// Historical content holds neither manifest file.
    #[error("{package}: content {content_id} recorded for version {version} contains no manifest\nThe ledger entry points at the wrong tree; run `portledger add-version {package} --overwrite-version`.")]
    MissingManifestInContent {
        package: String,
        version: Version,
        content_id: Oid,
    },

    /// Historical content holds a manifest that does not parse.
    #[error("{package}: manifest at {treeish} (recorded for version {version}) is invalid")]
    ContentManifest {
        package: String,
        version: Version,
        treeish: String,
        source: ManifestError,
    },

    /// The package's local manifest cannot be read.
    #[error("{package}: cannot read the local manifest")]
    LocalManifest {
        package: String,
        source: ManifestError,
    },

    /// The baseline cannot be read, locked, or written.
    #[error("{package}: baseline access failed")]
    Baseline {
        package: String,
        source: BaselineError,
    },

    /// The version-control backend failed.
    #[error("{package}: git access failed")]
    Git { package: String, source: GitError },
}

impl ConsistencyError {
    /// Whether this error aborts a batch regardless of `keep_going`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsistencyError::LedgerParse { .. }
                | ConsistencyError::EmptyLedger { .. }
                | ConsistencyError::LedgerWrite { .. }
                | ConsistencyError::Baseline { .. }
                | ConsistencyError::Git { .. }
        )
    }

    /// The package the error is about.
    pub fn package(&self) -> &str {
        match self {
            ConsistencyError::LedgerParse { package, .. }
            | ConsistencyError::EmptyLedger { package, .. }
            | ConsistencyError::LedgerWrite { package, .. }
            | ConsistencyError::MissingLedger { package, .. }
            | ConsistencyError::Ordering { package, .. }
            | ConsistencyError::UnregisteredVersion { package, .. }
            | ConsistencyError::SchemeConflict { package, .. }
            | ConsistencyError::StaleHistory { package, .. }
            | ConsistencyError::MissingBaseline { package, .. }
            | ConsistencyError::StaleBaseline { package, .. }
            | ConsistencyError::UncommittedChange { package, .. }
            | ConsistencyError::MissingVersionBump { package, .. }
            | ConsistencyError::ContentMismatch { package, .. }
            | ConsistencyError::MissingManifestInContent { package, .. }
            | ConsistencyError::ContentManifest { package, .. }
            | ConsistencyError::LocalManifest { package, .. }
            | ConsistencyError::Baseline { package, .. }
            | ConsistencyError::Git { package, .. } => package,
        }
    }

    /// Map a ledger load failure for `package`.
    ///
    /// `Empty` becomes [`ConsistencyError::EmptyLedger`] and `NotFound`
    /// becomes [`ConsistencyError::MissingLedger`]; everything else is a
    /// parse failure.
    pub(crate) fn from_ledger_load(package: &str, err: StoreError) -> Self {
        match err {
            StoreError::Empty { path } => ConsistencyError::EmptyLedger {
                package: package.to_string(),
                path,
            },
            StoreError::NotFound { path } => ConsistencyError::MissingLedger {
                package: package.to_string(),
                path,
            },
            other => ConsistencyError::LedgerParse {
                package: package.to_string(),
                source: other,
            },
        }
    }
}
