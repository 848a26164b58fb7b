//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware printing
//!
//! # Design
//!
//! All console output goes through this module so quiet, verbose and debug
//! modes behave the same in every command.

pub mod output;
