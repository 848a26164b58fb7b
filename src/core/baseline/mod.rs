//! core::baseline
//!
//! The shared snapshot of every package's endorsed version.
//!
//! # Modules
//!
//! - [`schema`] - The [`Baseline`] type and its JSON wire format
//! - [`store`] - Loading, atomic saving, and locked upserts
//!
//! # Invariants
//!
//! - A package present in the baseline references the version of the
//!   current (first) entry of its ledger
//! - Baseline rewrites are serialized by the baseline lock

pub mod schema;
pub mod store;

pub use schema::{parse_baseline, serialize_baseline, Baseline, BaselineSchemaError, DEFAULT_SNAPSHOT};
pub use store::{load_path, BaselineError, BaselineStore};
