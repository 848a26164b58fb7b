//! portledger - Version history and baseline consistency for a package registry
//!
//! A package registry keeps, for every package, a ledger of every version it
//! ever published together with the exact content each was published with,
//! plus one shared baseline naming the endorsed version of every package.
//! portledger checks that manifests, ledgers and the baseline agree, and
//! records new versions without ever corrupting history.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Checker, updater, deep content verification, batch driver
//! - [`core`] - Domain types, file formats, storage, configuration
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Console output
//!
//! # Correctness Invariants
//!
//! 1. A ledger file that exists is never empty; its first entry is current
//! 2. Version text is unique within a ledger, across schemes
//! 3. Every write replaces a file atomically; no partial file is visible
//! 4. Concurrent baseline updates never lose each other's changes
//! 5. Checking never writes; updating never fixes what it was not asked to

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
