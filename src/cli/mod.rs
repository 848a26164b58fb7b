//! cli
//!
//! Command-line interface layer for portledger.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve the registry root and configuration into an engine context
//! - Delegate to command handlers and report results
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Ledger and baseline changes only happen
//! inside the engine's updater.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. An `Err` means the
/// process should exit with a failure status.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    commands::dispatch(cli)
}
