//! core::ledger::schema
//!
//! The per-package version ledger and its JSON wire format.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "versions": [
//!     { "git-tree": "<40 hex>", "version-semver": "1.1.0", "port-version": 0 },
//!     { "git-tree": "<40 hex>", "version-semver": "1.0.0", "port-version": 2 }
//!   ]
//! }
//! ```
//!
//! Entries are newest first. Each entry carries exactly one of the four
//! scheme fields (see [`VersionScheme::field_name`]). `port-version` is
//! optional on input and always written on output.
//!
//! # Strictness
//!
//! Unknown fields are rejected, every `git-tree` must be a valid object id,
//! and every version text must be valid for its scheme. A ledger with no
//! entries does not parse into a [`Ledger`]; callers receive an empty list
//! and decide how to report it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Oid;
use crate::core::version::{LedgerEntry, SchemedVersion, Version, VersionScheme};

/// Errors from parsing ledger JSON.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("entry {index}: {message}")]
    Entry { index: usize, message: String },

    #[error("failed to serialize ledger: {0}")]
    Serialize(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LedgerFile {
    versions: Vec<RawEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    #[serde(rename = "git-tree")]
    git_tree: String,
    #[serde(rename = "version", default, skip_serializing_if = "Option::is_none")]
    relaxed: Option<String>,
    #[serde(rename = "version-semver", default, skip_serializing_if = "Option::is_none")]
    semver: Option<String>,
    #[serde(rename = "version-date", default, skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(rename = "version-string", default, skip_serializing_if = "Option::is_none")]
    string: Option<String>,
    #[serde(rename = "port-version", default)]
    port_version: u32,
}

impl RawEntry {
    fn from_entry(entry: &LedgerEntry) -> Self {
        let text = Some(entry.version().text().to_string());
        let mut raw = RawEntry {
            git_tree: entry.content_id.to_string(),
            relaxed: None,
            semver: None,
            date: None,
            string: None,
            port_version: entry.version().port_revision(),
        };
        match entry.schemed_version.scheme {
            VersionScheme::Relaxed => raw.relaxed = text,
            VersionScheme::Semver => raw.semver = text,
            VersionScheme::Date => raw.date = text,
            VersionScheme::String => raw.string = text,
        }
        raw
    }

    fn into_entry(self) -> Result<LedgerEntry, String> {
        let declared: Vec<(VersionScheme, String)> = [
            (VersionScheme::Relaxed, self.relaxed),
            (VersionScheme::Semver, self.semver),
            (VersionScheme::Date, self.date),
            (VersionScheme::String, self.string),
        ]
        .into_iter()
        .filter_map(|(scheme, text)| text.map(|t| (scheme, t)))
        .collect();

        let (scheme, text) = match <[_; 1]>::try_from(declared) {
            Ok([single]) => single,
            Err(declared) if declared.is_empty() => {
                return Err("missing version field".to_string());
            }
            Err(declared) => {
                let fields: Vec<_> = declared.iter().map(|(s, _)| s.field_name()).collect();
                return Err(format!("multiple version fields: {}", fields.join(", ")));
            }
        };

        let schemed =
            SchemedVersion::parse(scheme, text, self.port_version).map_err(|e| e.to_string())?;
        let content_id = Oid::new(self.git_tree).map_err(|e| e.to_string())?;

        Ok(LedgerEntry::new(schemed, content_id))
    }
}

/// Parse ledger JSON into its entries, newest first.
///
/// An empty `versions` array parses successfully into an empty list.
pub fn parse_entries(json: &str) -> Result<Vec<LedgerEntry>, SchemaError> {
    let file: LedgerFile =
        serde_json::from_str(json).map_err(|e| SchemaError::Json(e.to_string()))?;

    file.versions
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            raw.into_entry()
                .map_err(|message| SchemaError::Entry { index, message })
        })
        .collect()
}

/// Serialize a ledger as pretty JSON with a trailing newline.
pub fn serialize_ledger(ledger: &Ledger) -> Result<String, SchemaError> {
    let file = LedgerFile {
        versions: ledger.entries.iter().map(RawEntry::from_entry).collect(),
    };
    let mut json =
        serde_json::to_string_pretty(&file).map_err(|e| SchemaError::Serialize(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

/// A non-empty, newest-first history of a package's published versions.
///
/// The first entry is the *current* version. Positions are stable: an
/// in-place correction never reorders the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// A ledger holding a single entry.
    pub fn new(first: LedgerEntry) -> Self {
        Self {
            entries: vec![first],
        }
    }

    /// Build a ledger from newest-first entries. Returns `None` when empty.
    pub fn from_entries(entries: Vec<LedgerEntry>) -> Option<Self> {
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    /// The current (newest) entry.
    pub fn current(&self) -> &LedgerEntry {
        &self.entries[0]
    }

    /// All entries, newest first.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the entry recording `version`, if any.
    pub fn position_of_version(&self, version: &Version) -> Option<usize> {
        self.entries.iter().position(|e| e.version() == version)
    }

    /// Position of the first entry pinned to `content_id`, if any.
    pub fn position_of_content(&self, content_id: &Oid) -> Option<usize> {
        self.entries.iter().position(|e| &e.content_id == content_id)
    }

    /// Insert a new current entry.
    pub fn prepend(&mut self, entry: LedgerEntry) {
        self.entries.insert(0, entry);
    }

    /// Replace the entry at `index` in place.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn replace(&mut self, index: usize, entry: LedgerEntry) {
        self.entries[index] = entry;
    }
}
