//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`. The engine reaches historical content through the
//! [`ContentSource`](crate::engine::content::ContentSource) trait, which
//! [`Git`] implements.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Blob lookup by tree-ish (`<tree>:<path>`)
//! - Hashing a working-tree directory into a tree id
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - Nothing here writes to the object database
//! - All object ids leave this module as [`Oid`](crate::core::types::Oid)

mod interface;

pub use interface::{Git, GitError};
