//! core::version
//!
//! Scheme-tagged versions and ledger entries.
//!
//! # Model
//!
//! - [`VersionScheme`] - closed set of comparison disciplines
//! - [`Version`] - version text plus port revision
//! - [`SchemedVersion`] - what a manifest declares and a ledger records
//! - [`LedgerEntry`] - a schemed version pinned to a content id
//!
//! Equality is structural everywhere: two versions are equal when both the
//! text and the port revision match. Ordering between versions of the same
//! scheme is not modelled here; the ledger keeps its own newest-first order.
//!
//! # Example
//!
//! ```
//! use portledger::core::version::{SchemedVersion, Version, VersionScheme};
//!
//! let v = SchemedVersion::parse(VersionScheme::Semver, "1.2.3", 2).unwrap();
//! assert_eq!(v.version.to_string(), "1.2.3#2");
//! assert_eq!(v.scheme.field_name(), "version-semver");
//!
//! assert_eq!(Version::new("1.0", 0).to_string(), "1.0");
//! assert!(SchemedVersion::parse(VersionScheme::Relaxed, "1.0-beta", 0).is_err());
//! ```

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::types::Oid;

/// Errors from version validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("version text cannot be empty")]
    Empty,

    #[error("`{text}` is not a valid {scheme} version: {reason}")]
    InvalidText {
        scheme: VersionScheme,
        text: String,
        reason: String,
    },
}

/// The comparison discipline declared for a version.
///
/// The scheme also decides which JSON field carries the version text in
/// manifests and ledger files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionScheme {
    /// Dot-separated numeric components (`version`).
    Relaxed,
    /// Semantic versioning 2.0 (`version-semver`).
    Semver,
    /// `YYYY-MM-DD` with optional numeric suffixes (`version-date`).
    Date,
    /// Opaque text, equality only (`version-string`).
    String,
}

impl VersionScheme {
    /// Every scheme, in the order fields are probed during parsing.
    pub const ALL: [VersionScheme; 4] = [
        VersionScheme::Relaxed,
        VersionScheme::Semver,
        VersionScheme::Date,
        VersionScheme::String,
    ];

    /// The JSON field name used to serialize a version of this scheme.
    pub fn field_name(self) -> &'static str {
        match self {
            VersionScheme::Relaxed => "version",
            VersionScheme::Semver => "version-semver",
            VersionScheme::Date => "version-date",
            VersionScheme::String => "version-string",
        }
    }

    /// Inverse of [`field_name`](Self::field_name).
    pub fn from_field_name(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.field_name() == field)
    }

    /// Check that `text` is well formed for this scheme.
    ///
    /// # Errors
    ///
    /// - [`VersionError::Empty`] for empty text
    /// - [`VersionError::InvalidText`] when the text breaks the scheme's grammar
    pub fn validate(self, text: &str) -> Result<(), VersionError> {
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let invalid = |reason: &str| VersionError::InvalidText {
            scheme: self,
            text: text.to_string(),
            reason: reason.to_string(),
        };

        // '#' separates the port revision in display form
        if text.contains('#') {
            return Err(invalid("'#' is reserved for the port revision"));
        }

        match self {
            VersionScheme::Relaxed => {
                if !is_dotted_numeric(text) {
                    return Err(invalid("expected dot-separated numbers"));
                }
            }
            VersionScheme::Semver => {
                semver::Version::parse(text).map_err(|e| invalid(&e.to_string()))?;
            }
            VersionScheme::Date => {
                let (date, suffix) = match text.split_once('.') {
                    Some((date, suffix)) => (date, Some(suffix)),
                    None => (text, None),
                };
                let shape_ok = date.len() == 10
                    && date
                        .char_indices()
                        .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
                if !shape_ok || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                    return Err(invalid("expected a calendar date YYYY-MM-DD"));
                }
                if suffix.is_some_and(|s| !is_dotted_numeric(s)) {
                    return Err(invalid("date suffix must be dot-separated numbers"));
                }
            }
            VersionScheme::String => {}
        }

        Ok(())
    }
}

impl std::fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

fn is_dotted_numeric(text: &str) -> bool {
    text.split('.')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Version text plus port revision.
///
/// The port revision counts re-publications of the same upstream version
/// and is omitted from display when zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    text: String,
    port_revision: u32,
}

impl Version {
    /// Create a version without validation.
    pub fn new(text: impl Into<String>, port_revision: u32) -> Self {
        Self {
            text: text.into(),
            port_revision,
        }
    }

    /// The version text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The port revision (0 when never re-published).
    pub fn port_revision(&self) -> u32 {
        self.port_revision
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.port_revision == 0 {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}#{}", self.text, self.port_revision)
        }
    }
}

/// A version tagged with its scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemedVersion {
    pub scheme: VersionScheme,
    pub version: Version,
}

impl SchemedVersion {
    /// Pair a scheme with a version without validation.
    pub fn new(scheme: VersionScheme, version: Version) -> Self {
        Self { scheme, version }
    }

    /// Build a schemed version, validating the text against the scheme.
    pub fn parse(
        scheme: VersionScheme,
        text: impl Into<String>,
        port_revision: u32,
    ) -> Result<Self, VersionError> {
        let text = text.into();
        scheme.validate(&text)?;
        Ok(Self::new(scheme, Version::new(text, port_revision)))
    }
}

impl std::fmt::Display for SchemedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.version, self.scheme)
    }
}

/// One published version of a package and the content it was published with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub schemed_version: SchemedVersion,
    pub content_id: Oid,
}

impl LedgerEntry {
    pub fn new(schemed_version: SchemedVersion, content_id: Oid) -> Self {
        Self {
            schemed_version,
            content_id,
        }
    }

    /// Shorthand for the entry's version.
    pub fn version(&self) -> &Version {
        &self.schemed_version.version
    }
}
