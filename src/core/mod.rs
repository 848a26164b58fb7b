//! core
//!
//! Core domain types, file formats, and storage for portledger.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PackageName, Oid
//! - [`version`] - Schemes, versions, and ledger entries
//! - [`manifest`] - Reading a package's declared version
//! - [`ledger`] - Per-package version history and its storage
//! - [`baseline`] - The shared baseline and its storage
//! - [`atomic`] - Temp-file-and-rename writes
//! - [`ops`] - Locking around shared writes
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for the registry layout
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction
//! - Schemas are strict and self-describing
//! - No file is ever partially written

pub mod atomic;
pub mod baseline;
pub mod config;
pub mod ledger;
pub mod manifest;
pub mod ops;
pub mod paths;
pub mod types;
pub mod version;
