//! core::ledger
//!
//! Per-package version history.
//!
//! # Modules
//!
//! - [`schema`] - The [`Ledger`] type and its JSON wire format
//! - [`store`] - Loading and atomically saving ledger files
//!
//! # Invariants
//!
//! - A ledger file that exists holds at least one entry
//! - The first entry is the package's current version
//! - History only grows, or has one entry corrected in place under an
//!   explicit overwrite; entries are never removed or reordered

pub mod schema;
pub mod store;

pub use schema::{parse_entries, serialize_ledger, Ledger, SchemaError};
pub use store::{load_path, LedgerStore, StoreError};
