//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PackageName`] - Validated package (port) name
//! - [`Oid`] - Git object identifier used as an immutable content id
//!
//! # Validation
//!
//! These types enforce validity at construction time. A ledger entry can
//! never carry a malformed content id, and a package name can never be
//! used to build a path outside the registry layout.
//!
//! # Examples
//!
//! ```
//! use portledger::core::types::{Oid, PackageName};
//!
//! let name = PackageName::new("zlib-ng").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(name.as_str(), "zlib-ng");
//!
//! assert!(PackageName::new("../etc").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated package name.
///
/// Package names are lowercase ASCII identifiers made of alphanumeric
/// segments joined by single hyphens:
/// - Cannot be empty
/// - Only `a-z`, `0-9` and `-`
/// - Cannot start or end with `-`, cannot contain `--`
///
/// # Example
///
/// ```
/// use portledger::core::types::PackageName;
///
/// assert!(PackageName::new("boost-asio").is_ok());
/// assert!(PackageName::new("7zip").is_ok());
///
/// assert!(PackageName::new("").is_err());
/// assert!(PackageName::new("Boost").is_err());
/// assert!(PackageName::new("-lead").is_err());
/// assert!(PackageName::new("a--b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new validated package name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPackageName` if the name breaks the naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidPackageName(
                "package name cannot be empty".into(),
            ));
        }

        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(TypeError::InvalidPackageName(format!(
                "package name cannot contain '{c}' (only a-z, 0-9 and '-')"
            )));
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(TypeError::InvalidPackageName(format!(
                "'{name}' cannot start or end with '-'"
            )));
        }

        if name.contains("--") {
            return Err(TypeError::InvalidPackageName(format!(
                "'{name}' cannot contain '--'"
            )));
        }

        Ok(())
    }

    /// Get the package name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first character, used to shard ledger files into directories.
    pub fn shard(&self) -> char {
        // Validation guarantees a non-empty ASCII name.
        self.0.as_bytes()[0] as char
    }
}

impl TryFrom<String> for PackageName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier: 40 lowercase hex characters (SHA-1).
///
/// In ledger files this is the `git-tree` of a package directory: an
/// immutable reference to the exact snapshot published under a version.
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use portledger::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

/// Length of a SHA-1 object id in hex.
pub const OID_HEX_LEN: usize = 40;

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a valid hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        if oid.len() != OID_HEX_LEN {
            return Err(TypeError::InvalidOid(format!(
                "expected {OID_HEX_LEN} hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!(
                "'{oid}' is not hexadecimal"
            )));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod package_name {
        use super::*;

        #[test]
        fn valid_names() {
            for name in ["zlib", "boost-asio", "7zip", "a", "abseil-cpp-2"] {
                assert!(PackageName::new(name).is_ok(), "{name} should be valid");
            }
        }

        #[test]
        fn invalid_names() {
            for name in ["", "Zlib", "a_b", "a.b", "a/b", "-a", "a-", "a--b", "a b", ".."] {
                assert!(PackageName::new(name).is_err(), "{name} should be invalid");
            }
        }

        #[test]
        fn shard_is_first_char() {
            assert_eq!(PackageName::new("zlib").unwrap().shard(), 'z');
            assert_eq!(PackageName::new("7zip").unwrap().shard(), '7');
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<PackageName, _> = serde_json::from_str("\"Bad Name\"");
            assert!(result.is_err());
        }
    }

    mod oid {
        use super::*;

        #[test]
        fn only_sha1_length() {
            assert!(Oid::new("a".repeat(40)).is_ok());
            assert!(Oid::new("b".repeat(64)).is_err());
            assert!(Oid::new("a".repeat(39)).is_err());
        }

        #[test]
        fn rejects_non_hex() {
            let err = Oid::new("g".repeat(40)).unwrap_err();
            assert!(matches!(err, TypeError::InvalidOid(_)));
        }

        #[test]
        fn normalizes_case() {
            let oid = Oid::new("A".repeat(40)).unwrap();
            assert_eq!(oid.as_str(), "a".repeat(40));
        }

        #[test]
        fn display_is_full_hex() {
            let oid = Oid::new("c".repeat(40)).unwrap();
            assert_eq!(oid.to_string(), "c".repeat(40));
        }
    }
}
