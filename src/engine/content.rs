//! engine::content
//!
//! Deep verification of ledger entries against immutable content.
//!
//! # Architecture
//!
//! Each ledger entry pins a tree id. The manifest inside that tree is the
//! authoritative record of what version was published. For every entry the
//! verifier asks a [`ContentSource`] for `<tree>:CONTROL`, then
//! `<tree>:vcpkg.json` (see [`ManifestSource::PROBE_ORDER`]). The first
//! file that exists is parsed and must declare exactly the recorded
//! scheme and version.
//!
//! This is the slow path: one backend lookup per entry and candidate file.
//! It only runs when deep verification is requested.
//!
//! # Example
//!
//! ```
//! use portledger::core::types::Oid;
//! use portledger::core::version::{LedgerEntry, SchemedVersion, VersionScheme};
//! use portledger::engine::content::{verify_entry, MemoryContentSource};
//!
//! let tree = Oid::new("a".repeat(40)).unwrap();
//! let mut source = MemoryContentSource::new();
//! source.insert(&tree, "vcpkg.json", r#"{"version": "1.0"}"#);
//!
//! let entry = LedgerEntry::new(
//!     SchemedVersion::parse(VersionScheme::Relaxed, "1.0", 0).unwrap(),
//!     tree,
//! );
//! assert!(verify_entry(&source, "zlib", &entry).is_ok());
//! ```

use std::collections::HashMap;

use super::errors::ConsistencyError;
use crate::core::ledger::Ledger;
use crate::core::manifest::ManifestSource;
use crate::core::types::Oid;
use crate::core::version::LedgerEntry;
use crate::git::{Git, GitError};

/// Read access to historical file content by tree-ish.
pub trait ContentSource {
    /// The text of the file at `treeish` (`<tree>:<path>`), or `None` if
    /// it does not exist.
    fn show(&self, treeish: &str) -> Result<Option<String>, GitError>;
}

impl ContentSource for Git {
    fn show(&self, treeish: &str) -> Result<Option<String>, GitError> {
        self.show_blob(treeish)
    }
}

/// An in-memory content store keyed by tree-ish.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    files: HashMap<String, String>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` as `<tree>:<file>`.
    pub fn insert(&mut self, tree: &Oid, file: &str, content: impl Into<String>) {
        self.files.insert(treeish(tree, file), content.into());
    }
}

impl ContentSource for MemoryContentSource {
    fn show(&self, treeish: &str) -> Result<Option<String>, GitError> {
        Ok(self.files.get(treeish).cloned())
    }
}

fn treeish(tree: &Oid, file: &str) -> String {
    format!("{}:{}", tree, file)
}

/// Check one ledger entry against the manifest stored in its tree.
pub fn verify_entry<S: ContentSource + ?Sized>(
    source: &S,
    package: &str,
    entry: &LedgerEntry,
) -> Result<(), ConsistencyError> {
    for candidate in ManifestSource::PROBE_ORDER {
        let treeish = treeish(&entry.content_id, candidate.file_name());
        let Some(text) = source.show(&treeish).map_err(|source| ConsistencyError::Git {
            package: package.to_string(),
            source,
        })?
        else {
            continue;
        };

        let found = candidate
            .parse(&text, &treeish)
            .map_err(|source| ConsistencyError::ContentManifest {
                package: package.to_string(),
                version: entry.version().clone(),
                treeish: treeish.clone(),
                source,
            })?;

        if found != entry.schemed_version {
            return Err(ConsistencyError::ContentMismatch {
                package: package.to_string(),
                content_id: entry.content_id.clone(),
                recorded: entry.schemed_version.clone(),
                found,
            });
        }
        return Ok(());
    }

    Err(ConsistencyError::MissingManifestInContent {
        package: package.to_string(),
        version: entry.version().clone(),
        content_id: entry.content_id.clone(),
    })
}

/// Check every entry of a ledger, stopping at the first failure.
pub fn verify_ledger_content<S: ContentSource + ?Sized>(
    source: &S,
    package: &str,
    ledger: &Ledger,
) -> Result<(), ConsistencyError> {
    ledger
        .entries()
        .iter()
        .try_for_each(|entry| verify_entry(source, package, entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::{SchemedVersion, VersionScheme};
    use std::cell::RefCell;

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    fn entry(scheme: VersionScheme, text: &str, rev: u32, tree: char) -> LedgerEntry {
        LedgerEntry::new(SchemedVersion::parse(scheme, text, rev).unwrap(), oid(tree))
    }

    /// Records every lookup so probe order can be asserted.
    struct Recording {
        inner: MemoryContentSource,
        lookups: RefCell<Vec<String>>,
    }

    impl ContentSource for Recording {
        fn show(&self, treeish: &str) -> Result<Option<String>, GitError> {
            self.lookups.borrow_mut().push(treeish.to_string());
            self.inner.show(treeish)
        }
    }

    #[test]
    fn matching_manifest_passes() {
        let mut source = MemoryContentSource::new();
        source.insert(&oid('a'), "vcpkg.json", r#"{"version-semver": "1.0.0", "port-version": 2}"#);

        let e = entry(VersionScheme::Semver, "1.0.0", 2, 'a');
        assert!(verify_entry(&source, "foo", &e).is_ok());
    }

    #[test]
    fn control_is_probed_first_and_wins() {
        let mut inner = MemoryContentSource::new();
        inner.insert(&oid('a'), "CONTROL", "Source: foo\nVersion: 1.0\n");
        inner.insert(&oid('a'), "vcpkg.json", r#"{"version": "9.9"}"#);
        let source = Recording {
            inner,
            lookups: RefCell::new(Vec::new()),
        };

        let e = entry(VersionScheme::String, "1.0", 0, 'a');
        verify_entry(&source, "foo", &e).unwrap();

        assert_eq!(*source.lookups.borrow(), vec![format!("{}:CONTROL", oid('a'))]);
    }

    #[test]
    fn falls_back_to_manifest_file() {
        let mut inner = MemoryContentSource::new();
        inner.insert(&oid('a'), "vcpkg.json", r#"{"version": "1.0"}"#);
        let source = Recording {
            inner,
            lookups: RefCell::new(Vec::new()),
        };

        let e = entry(VersionScheme::Relaxed, "1.0", 0, 'a');
        verify_entry(&source, "foo", &e).unwrap();
        assert_eq!(source.lookups.borrow().len(), 2);
    }

    #[test]
    fn no_manifest_in_content() {
        let source = MemoryContentSource::new();
        let e = entry(VersionScheme::Relaxed, "1.0", 0, 'a');

        let err = verify_entry(&source, "foo", &e).unwrap_err();
        assert!(matches!(err, ConsistencyError::MissingManifestInContent { .. }));
    }

    #[test]
    fn scheme_difference_is_mismatch() {
        let mut source = MemoryContentSource::new();
        source.insert(&oid('a'), "vcpkg.json", r#"{"version-string": "1.0"}"#);
        let e = entry(VersionScheme::Relaxed, "1.0", 0, 'a');

        let err = verify_entry(&source, "foo", &e).unwrap_err();
        match err {
            ConsistencyError::ContentMismatch { recorded, found, .. } => {
                assert_eq!(recorded.scheme, VersionScheme::Relaxed);
                assert_eq!(found.scheme, VersionScheme::String);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_manifest_names_treeish() {
        let mut source = MemoryContentSource::new();
        source.insert(&oid('a'), "vcpkg.json", "{ nope");
        let e = entry(VersionScheme::Relaxed, "1.0", 0, 'a');

        let err = verify_entry(&source, "foo", &e).unwrap_err();
        assert!(matches!(err, ConsistencyError::ContentManifest { .. }));
        assert!(err.to_string().contains(&format!("{}:vcpkg.json", oid('a'))));
    }

    #[test]
    fn ledger_stops_at_first_bad_entry() {
        let mut source = MemoryContentSource::new();
        source.insert(&oid('b'), "vcpkg.json", r#"{"version": "2.0"}"#);
        let ledger = Ledger::from_entries(vec![
            entry(VersionScheme::Relaxed, "2.0", 0, 'b'),
            entry(VersionScheme::Relaxed, "1.0", 0, 'a'),
        ])
        .unwrap();

        let err = verify_ledger_content(&source, "foo", &ledger).unwrap_err();
        match err {
            ConsistencyError::MissingManifestInContent { version, .. } => {
                assert_eq!(version.text(), "1.0")
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
