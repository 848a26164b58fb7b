//! core::baseline::schema
//!
//! The baseline snapshot and its JSON wire format.
//!
//! # Wire Format
//!
//! ```json
//! {
//!   "default": {
//!     "zlib": { "baseline": "1.2.13", "port-version": 1 },
//!     "zstd": { "baseline": "1.5.5", "port-version": 0 }
//!   }
//! }
//! ```
//!
//! Only the `default` snapshot is interpreted. Other top-level snapshot
//! keys are carried through unchanged so a rewrite never drops them.
//! Packages are written in sorted order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::version::Version;

/// The snapshot key holding the endorsed versions.
pub const DEFAULT_SNAPSHOT: &str = "default";

/// Errors from parsing baseline JSON.
#[derive(Debug, Error)]
pub enum BaselineSchemaError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("missing `{DEFAULT_SNAPSHOT}` snapshot")]
    MissingSnapshot,

    #[error("package `{package}`: {message}")]
    Entry { package: String, message: String },

    #[error("failed to serialize baseline: {0}")]
    Serialize(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBaselineVersion {
    baseline: String,
    #[serde(rename = "port-version", default)]
    port_version: u32,
}

/// Mapping from package name to its currently endorsed version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    versions: BTreeMap<String, Version>,
    other_snapshots: BTreeMap<String, serde_json::Value>,
}

impl Baseline {
    /// An empty baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// The endorsed version of a package.
    pub fn get(&self, package: &str) -> Option<&Version> {
        self.versions.get(package)
    }

    /// Set a package's endorsed version. Returns whether anything changed.
    pub fn set(&mut self, package: impl Into<String>, version: Version) -> bool {
        let package = package.into();
        if self.versions.get(&package) == Some(&version) {
            return false;
        }
        self.versions.insert(package, version);
        true
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Packages and versions in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Version)> {
        self.versions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parse baseline JSON.
pub fn parse_baseline(json: &str) -> Result<Baseline, BaselineSchemaError> {
    let mut snapshots: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| BaselineSchemaError::Json(e.to_string()))?;

    let default = snapshots
        .remove(DEFAULT_SNAPSHOT)
        .ok_or(BaselineSchemaError::MissingSnapshot)?;
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_value(default).map_err(|e| BaselineSchemaError::Json(e.to_string()))?;

    let mut versions = BTreeMap::new();
    for (package, value) in raw {
        let entry: RawBaselineVersion =
            serde_json::from_value(value).map_err(|e| BaselineSchemaError::Entry {
                package: package.clone(),
                message: e.to_string(),
            })?;
        if entry.baseline.is_empty() {
            return Err(BaselineSchemaError::Entry {
                package,
                message: "empty baseline version".to_string(),
            });
        }
        versions.insert(package, Version::new(entry.baseline, entry.port_version));
    }

    Ok(Baseline {
        versions,
        other_snapshots: snapshots,
    })
}

/// Serialize a baseline as pretty JSON with a trailing newline.
pub fn serialize_baseline(baseline: &Baseline) -> Result<String, BaselineSchemaError> {
    let default: BTreeMap<&str, RawBaselineVersion> = baseline
        .versions
        .iter()
        .map(|(package, version)| {
            (
                package.as_str(),
                RawBaselineVersion {
                    baseline: version.text().to_string(),
                    port_version: version.port_revision(),
                },
            )
        })
        .collect();

    let mut snapshots = serde_json::Map::new();
    for (key, value) in &baseline.other_snapshots {
        snapshots.insert(key.clone(), value.clone());
    }
    let default =
        serde_json::to_value(default).map_err(|e| BaselineSchemaError::Serialize(e.to_string()))?;
    snapshots.insert(DEFAULT_SNAPSHOT.to_string(), default);

    let mut json = serde_json::to_string_pretty(&snapshots)
        .map_err(|e| BaselineSchemaError::Serialize(e.to_string()))?;
    json.push('\n');
    Ok(json)
}
