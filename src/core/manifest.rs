//! core::manifest
//!
//! Reading the version a package declares.
//!
//! # Sources
//!
//! A package declares its version in one of two files, modelled as
//! [`ManifestSource`]:
//!
//! - [`ManifestSource::LegacyControlFile`] - `CONTROL`, RFC822-style
//!   paragraphs with `Version:` and optional `Port-Version:` fields. The
//!   version always uses the `String` scheme.
//! - [`ManifestSource::ManifestFile`] - `vcpkg.json`, a JSON object with
//!   exactly one of the scheme fields and an optional `port-version`.
//!
//! Only version fields are interpreted; everything else in either file is
//! ignored here.
//!
//! # Local vs historical
//!
//! [`load_local`] reads a package directory on disk and requires exactly
//! one of the two files. Historical content is probed in
//! [`ManifestSource::PROBE_ORDER`] by the content verifier.
//!
//! # Example
//!
//! ```
//! use portledger::core::manifest::ManifestSource;
//! use portledger::core::version::VersionScheme;
//!
//! let v = ManifestSource::ManifestFile
//!     .parse(r#"{"name": "zlib", "version": "1.3", "port-version": 2}"#, "zlib/vcpkg.json")
//!     .unwrap();
//! assert_eq!(v.scheme, VersionScheme::Relaxed);
//! assert_eq!(v.version.to_string(), "1.3#2");
//!
//! let v = ManifestSource::LegacyControlFile
//!     .parse("Source: zlib\nVersion: 1.2.11-9\n", "zlib/CONTROL")
//!     .unwrap();
//! assert_eq!(v.scheme, VersionScheme::String);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::version::{SchemedVersion, VersionError, VersionScheme};

/// Errors from reading or parsing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no {} or {} found in {}", ManifestSource::LegacyControlFile.file_name(), ManifestSource::ManifestFile.file_name(), dir.display())]
    NotFound { dir: PathBuf },

    #[error("{} contains both {} and {}; remove one", dir.display(), ManifestSource::LegacyControlFile.file_name(), ManifestSource::ManifestFile.file_name())]
    Ambiguous { dir: PathBuf },

    #[error("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("{origin}: {message}")]
    Syntax { origin: String, message: String },

    #[error("{origin}: no version field declared")]
    MissingVersion { origin: String },

    #[error("{origin}: multiple version fields declared: {}", fields.join(", "))]
    MultipleVersions { origin: String, fields: Vec<String> },

    #[error("{origin}: invalid port-version: {message}")]
    InvalidPortVersion { origin: String, message: String },

    #[error("{origin}: invalid version")]
    InvalidVersion { origin: String, source: VersionError },
}

/// The file a package's version is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestSource {
    /// Legacy `CONTROL` paragraphs.
    LegacyControlFile,
    /// JSON `vcpkg.json` manifest.
    ManifestFile,
}

impl ManifestSource {
    /// Order in which historical content is probed; first hit wins.
    pub const PROBE_ORDER: [ManifestSource; 2] =
        [ManifestSource::LegacyControlFile, ManifestSource::ManifestFile];

    /// File name inside a package directory.
    pub fn file_name(self) -> &'static str {
        match self {
            ManifestSource::LegacyControlFile => "CONTROL",
            ManifestSource::ManifestFile => "vcpkg.json",
        }
    }

    /// Extract the declared version from file contents.
    ///
    /// `origin` names where the text came from (a path or a tree-ish) and
    /// is used only in error messages.
    pub fn parse(self, text: &str, origin: &str) -> Result<SchemedVersion, ManifestError> {
        match self {
            ManifestSource::LegacyControlFile => parse_control(text, origin),
            ManifestSource::ManifestFile => parse_manifest_json(text, origin),
        }
    }
}

impl std::fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Read the declared version of the package in `dir`.
///
/// # Errors
///
/// - [`ManifestError::NotFound`] if neither manifest file exists
/// - [`ManifestError::Ambiguous`] if both exist
/// - any parse error of the file that exists
pub fn load_local(dir: &Path) -> Result<(ManifestSource, SchemedVersion), ManifestError> {
    let present: Vec<ManifestSource> = ManifestSource::PROBE_ORDER
        .into_iter()
        .filter(|source| dir.join(source.file_name()).is_file())
        .collect();

    let source = match present.as_slice() {
        [] => {
            return Err(ManifestError::NotFound {
                dir: dir.to_path_buf(),
            })
        }
        [single] => *single,
        _ => {
            return Err(ManifestError::Ambiguous {
                dir: dir.to_path_buf(),
            })
        }
    };

    let path = dir.join(source.file_name());
    let text = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;
    let version = source.parse(&text, &path.display().to_string())?;
    Ok((source, version))
}

fn parse_manifest_json(text: &str, origin: &str) -> Result<SchemedVersion, ManifestError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ManifestError::Syntax {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
    let object = value.as_object().ok_or_else(|| ManifestError::Syntax {
        origin: origin.to_string(),
        message: "manifest must be a JSON object".to_string(),
    })?;

    let declared: Vec<(VersionScheme, &serde_json::Value)> = VersionScheme::ALL
        .into_iter()
        .filter_map(|scheme| object.get(scheme.field_name()).map(|v| (scheme, v)))
        .collect();

    let (scheme, value) = match declared.as_slice() {
        [] => {
            return Err(ManifestError::MissingVersion {
                origin: origin.to_string(),
            })
        }
        [single] => *single,
        many => {
            return Err(ManifestError::MultipleVersions {
                origin: origin.to_string(),
                fields: many.iter().map(|(s, _)| s.field_name().to_string()).collect(),
            })
        }
    };

    let text = value.as_str().ok_or_else(|| ManifestError::Syntax {
        origin: origin.to_string(),
        message: format!("`{}` must be a string", scheme.field_name()),
    })?;

    let port_revision = match object.get("port-version") {
        None => 0,
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| ManifestError::InvalidPortVersion {
                origin: origin.to_string(),
                message: format!("expected a non-negative integer, found {v}"),
            })?,
    };

    SchemedVersion::parse(scheme, text, port_revision).map_err(|source| {
        ManifestError::InvalidVersion {
            origin: origin.to_string(),
            source,
        }
    })
}

fn parse_control(text: &str, origin: &str) -> Result<SchemedVersion, ManifestError> {
    let syntax = |line: usize, message: &str| ManifestError::Syntax {
        origin: origin.to_string(),
        message: format!("line {line}: {message}"),
    };

    // Only the first paragraph describes the package itself
    let mut fields: Vec<(String, String)> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            if fields.is_empty() {
                continue;
            }
            break;
        }
        if line.starts_with('#') {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            let (_, value) = fields
                .last_mut()
                .ok_or_else(|| syntax(line_no, "continuation line without a field"))?;
            value.push('\n');
            value.push_str(line.trim());
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| syntax(line_no, "expected `Field: value`"))?;
        let name = name.trim();
        if fields.iter().any(|(existing, _)| existing == name) {
            return Err(syntax(line_no, &format!("duplicate field `{name}`")));
        }
        fields.push((name.to_string(), value.trim().to_string()));
    }

    let field = |wanted: &str| {
        fields
            .iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, value)| value.as_str())
    };

    let text = field("Version").ok_or_else(|| ManifestError::MissingVersion {
        origin: origin.to_string(),
    })?;

    let port_revision = match field("Port-Version") {
        None => 0,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|e| ManifestError::InvalidPortVersion {
                origin: origin.to_string(),
                message: format!("`{raw}`: {e}"),
            })?,
    };

    SchemedVersion::parse(VersionScheme::String, text, port_revision).map_err(|source| {
        ManifestError::InvalidVersion {
            origin: origin.to_string(),
            source,
        }
    })
}
