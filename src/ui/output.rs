//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout, diagnostics to stderr. Every function takes the
//! current [`Verbosity`]; only errors ignore it.

use std::error::Error;
use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Verbose mode - per-package success lines
    Verbose,
    /// Debug mode - verbose output plus diagnostics
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. `quiet` wins over the others.
    pub fn from_flags(quiet: bool, verbose: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message only in verbose or debug mode.
pub fn verbose(message: impl Display, verbosity: Verbosity) {
    if verbosity >= Verbosity::Verbose {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print an error followed by each of its causes.
pub fn error_chain(err: &(dyn Error + 'static)) {
    error(chain(err));
}

/// `err` and its sources joined by `: `, as anyhow's `{:#}` renders them.
pub fn chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(source) = cause {
        message.push_str(": ");
        message.push_str(&source.to_string());
        cause = source.source();
    }
    message
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}
