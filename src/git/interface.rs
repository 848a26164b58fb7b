//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! portledger. Every interaction with the repository flows through the
//! [`Git`] struct, which returns strong types and normalizes errors into
//! typed failure categories.
//!
//! # Architecture
//!
//! Two capabilities are needed:
//!
//! - **Historical content**: [`Git::show_blob`] resolves a tree-ish such
//!   as `<tree>:vcpkg.json` to the text of a blob.
//! - **Working-tree content id**: [`Git::tree_oid_for_dir`] hashes a
//!   directory into the tree id it would have if committed as-is.
//!
//! Hashing uses `git2::Oid::hash_object` and never writes to the object
//! database, so read-only commands stay read-only.
//!
//! # Error Handling
//!
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BareRepo`]: Repository has no working directory
//! - [`GitError::NotABlob`]: A tree-ish resolved to something other than a file
//! - [`GitError::InvalidUtf8`]: A blob is not text
//!
//! # Example
//!
//! ```ignore
//! use portledger::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let tree = git.tree_oid_for_dir(Path::new("ports/zlib"))?;
//! let manifest = git.show_blob(&format!("{}:vcpkg.json", tree))?;
//! ```

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID or tree-ish that was not found
        oid: String,
    },

    /// Invalid object id or tree-ish.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// A tree-ish resolved to a tree or commit instead of a file.
    #[error("{treeish} is not a file")]
    NotABlob {
        /// The tree-ish that was resolved
        treeish: String,
    },

    /// Blob content is not valid UTF-8.
    #[error("blob is not valid UTF-8: {oid}")]
    InvalidUtf8 {
        /// The OID or tree-ish of the blob
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn from_io(err: std::io::Error, path: &Path) -> Self {
        GitError::AccessError {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidPackageName(msg) => GitError::Internal { message: msg },
        }
    }
}

const MODE_TREE: u32 = 0o040000;
const MODE_FILE: u32 = 0o100644;
const MODE_EXECUTABLE: u32 = 0o100755;
const MODE_SYMLINK: u32 = 0o120000;

struct TreeItem {
    name: Vec<u8>,
    mode: u32,
    oid: git2::Oid,
}

impl TreeItem {
    /// Git orders tree entries as if directory names ended in `/`.
    fn sort_key(&self) -> Vec<u8> {
        let mut key = self.name.clone();
        if self.mode == MODE_TREE {
            key.push(b'/');
        }
        key
    }
}

/// The Git repository interface.
///
/// All Git operations in portledger go through this struct. It wraps
/// `git2::Repository` and provides strongly-typed, error-normalized access.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// The root of the working tree.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // Historical Content
    // =========================================================================

    /// Read the text of the blob at `treeish` (e.g. `<tree>:CONTROL`).
    ///
    /// Returns `Ok(None)` when the tree-ish does not resolve, either because
    /// the object is unknown or the path is absent from the tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotABlob`] if the tree-ish names a directory
    /// - [`GitError::InvalidUtf8`] if the blob is not UTF-8
    pub fn show_blob(&self, treeish: &str) -> Result<Option<String>, GitError> {
        let object = match self.repo.revparse_single(treeish) {
            Ok(object) => object,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, treeish)),
        };

        let blob = object.into_blob().map_err(|_| GitError::NotABlob {
            treeish: treeish.to_string(),
        })?;

        String::from_utf8(blob.content().to_vec())
            .map(Some)
            .map_err(|_| GitError::InvalidUtf8 {
                oid: treeish.to_string(),
            })
    }

    // =========================================================================
    // Working-Tree Hashing
    // =========================================================================

    /// The tree id `dir` would have if committed as it is on disk.
    ///
    /// Files the index reports clean contribute their index entry, so the
    /// result matches the committed tree whatever the checkout filters did
    /// to the bytes on disk. Other regular files hash as `100644` or
    /// `100755` blobs after end-of-line normalization, symlinks as `120000`
    /// blobs of their target. Empty directories and untracked paths matched
    /// by the ignore rules are left out, as git would.
    pub fn tree_oid_for_dir(&self, dir: &Path) -> Result<Oid, GitError> {
        let dir = fs::canonicalize(dir).map_err(|e| GitError::from_io(e, dir))?;
        let work_dir = self.work_dir()?;
        let work_dir = fs::canonicalize(work_dir).map_err(|e| GitError::from_io(e, work_dir))?;

        let mut index = self
            .repo
            .index()
            .map_err(|e| GitError::from_git2(e, "index"))?;
        index
            .read(false)
            .map_err(|e| GitError::from_git2(e, "index"))?;
        let walk = Walk {
            work_dir,
            index,
            autocrlf: self.autocrlf(),
        };

        let oid = match self.hash_dir(&walk, &dir)? {
            Some(oid) => oid,
            None => git2::Oid::hash_object(git2::ObjectType::Tree, &[])
                .map_err(|e| GitError::from_git2(e, "empty tree"))?,
        };
        Ok(Oid::new(oid.to_string())?)
    }

    fn hash_dir(&self, walk: &Walk, dir: &Path) -> Result<Option<git2::Oid>, GitError> {
        let mut items = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| GitError::from_io(e, dir))?;

        for entry in entries {
            let entry = entry.map_err(|e| GitError::from_io(e, dir))?;
            let path = entry.path();
            let name = entry.file_name();
            if name == ".git" {
                continue;
            }
            let rel = walk.relative(&path);

            let file_type = entry.file_type().map_err(|e| GitError::from_io(e, &path))?;
            let (mode, oid) = if file_type.is_dir() {
                if let Some(rel) = &rel {
                    if self.is_ignored(rel)? && !walk.tracks_under(rel) {
                        continue;
                    }
                }
                match self.hash_dir(walk, &path)? {
                    Some(oid) => (MODE_TREE, oid),
                    None => continue,
                }
            } else if file_type.is_symlink() || file_type.is_file() {
                let tracked = rel.as_ref().and_then(|rel| walk.tracked(rel));
                if let Some(rel) = &rel {
                    if tracked.is_none() && self.is_ignored(rel)? {
                        continue;
                    }
                }
                match (&rel, tracked) {
                    (Some(rel), Some(indexed)) if self.is_clean(rel)? => (indexed.mode, indexed.id),
                    _ if file_type.is_symlink() => {
                        let target =
                            fs::read_link(&path).map_err(|e| GitError::from_io(e, &path))?;
                        (MODE_SYMLINK, hash_blob(&os_bytes(target.as_os_str()), &path)?)
                    }
                    _ => {
                        let metadata = entry.metadata().map_err(|e| GitError::from_io(e, &path))?;
                        let bytes = fs::read(&path).map_err(|e| GitError::from_io(e, &path))?;
                        let bytes = if self.normalizes_eol(walk, rel.as_deref(), &bytes)? {
                            crlf_to_lf(&bytes)
                        } else {
                            bytes
                        };
                        (file_mode(&metadata), hash_blob(&bytes, &path)?)
                    }
                }
            } else {
                continue;
            };

            items.push(TreeItem {
                name: os_bytes(&name),
                mode,
                oid,
            });
        }

        if items.is_empty() {
            return Ok(None);
        }

        items.sort_by_key(TreeItem::sort_key);
        let mut buf = Vec::new();
        for item in &items {
            buf.extend_from_slice(format!("{:o} ", item.mode).as_bytes());
            buf.extend_from_slice(&item.name);
            buf.push(0);
            buf.extend_from_slice(item.oid.as_bytes());
        }

        git2::Oid::hash_object(git2::ObjectType::Tree, &buf)
            .map(Some)
            .map_err(|e| GitError::from_git2(e, &dir.display().to_string()))
    }

    fn is_ignored(&self, rel: &str) -> Result<bool, GitError> {
        self.repo
            .is_path_ignored(rel)
            .map_err(|e| GitError::from_git2(e, rel))
    }

    /// Whether the working copy of a tracked file matches its index entry.
    fn is_clean(&self, rel: &str) -> Result<bool, GitError> {
        let status = self
            .repo
            .status_file(Path::new(rel))
            .map_err(|e| GitError::from_git2(e, rel))?;
        Ok(!status.intersects(
            git2::Status::WT_MODIFIED | git2::Status::WT_TYPECHANGE | git2::Status::WT_NEW,
        ))
    }

    fn autocrlf(&self) -> AutoCrlf {
        let value = self
            .repo
            .config()
            .and_then(|config| config.get_string("core.autocrlf"))
            .unwrap_or_default();
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => AutoCrlf::True,
            "input" => AutoCrlf::Input,
            _ => AutoCrlf::False,
        }
    }

    /// Whether `git add` would turn CRLF into LF for this file.
    fn normalizes_eol(&self, walk: &Walk, rel: Option<&str>, bytes: &[u8]) -> Result<bool, GitError> {
        let text = match rel {
            Some(rel) => self.attr(rel, "text")?,
            None => AttrState::Unspecified,
        };
        let binary = bytes.contains(&0);
        Ok(match text {
            AttrState::Unset => false,
            AttrState::Set => true,
            AttrState::Value(ref v) if v == "auto" => !binary,
            AttrState::Value(_) => false,
            AttrState::Unspecified => {
                let eol = match rel {
                    Some(rel) => self.attr(rel, "eol")?,
                    None => AttrState::Unspecified,
                };
                match eol {
                    AttrState::Value(_) => !binary,
                    _ => walk.autocrlf != AutoCrlf::False && !binary,
                }
            }
        })
    }

    fn attr(&self, rel: &str, name: &str) -> Result<AttrState, GitError> {
        let value = self
            .repo
            .get_attr(Path::new(rel), name, git2::AttrCheckFlags::FILE_THEN_INDEX)
            .map_err(|e| GitError::from_git2(e, rel))?;
        Ok(match git2::AttrValue::from_string(value) {
            git2::AttrValue::True => AttrState::Set,
            git2::AttrValue::False => AttrState::Unset,
            git2::AttrValue::String(v) => AttrState::Value(v.to_string()),
            git2::AttrValue::Bytes(_) | git2::AttrValue::Unspecified => AttrState::Unspecified,
        })
    }
}

/// Repository state shared by one tree hashing pass.
struct Walk {
    work_dir: PathBuf,
    index: git2::Index,
    autocrlf: AutoCrlf,
}

impl Walk {
    /// The `/`-separated path of `path` inside the work tree.
    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.work_dir).ok()?;
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn tracked(&self, rel: &str) -> Option<git2::IndexEntry> {
        self.index.get_path(Path::new(rel), 0)
    }

    fn tracks_under(&self, rel: &str) -> bool {
        self.index.find_prefix(format!("{}/", rel)).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AutoCrlf {
    False,
    True,
    Input,
}

enum AttrState {
    Set,
    Unset,
    Value(String),
    Unspecified,
}

fn hash_blob(bytes: &[u8], path: &Path) -> Result<git2::Oid, GitError> {
    git2::Oid::hash_object(git2::ObjectType::Blob, bytes)
        .map_err(|e| GitError::from_git2(e, &path.display().to_string()))
}

fn crlf_to_lf(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        MODE_EXECUTABLE
    } else {
        MODE_FILE
    }
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    MODE_FILE
}

#[cfg(unix)]
fn os_bytes(s: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    s.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_bytes(s: &OsStr) -> Vec<u8> {
    s.to_string_lossy().replace('\\', "/").into_bytes()
}
