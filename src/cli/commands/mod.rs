//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT write ledgers or the baseline directly.

mod add_version;
mod completion;
mod verify;

pub use add_version::add_version;
pub use completion::completion;
pub use verify::verify;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::args::{Cli, Command};
use crate::core::config::Config;
use crate::engine::Context;
use crate::git::Git;
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Verify {
            exclude,
            verify_git_trees,
            verbose,
            jobs,
        } => {
            let flags = OutputFlags {
                quiet: cli.quiet,
                verbose,
                debug: cli.debug,
            };
            let ctx = build_context(cli.root.as_deref(), flags, jobs)?;
            verify::verify(&ctx, &exclude, verify_git_trees)
        }
        Command::AddVersion {
            package,
            all,
            overwrite_version,
            keep_going,
            verbose,
            jobs,
        } => {
            // A single package always reports what was recorded
            let flags = OutputFlags {
                quiet: cli.quiet,
                verbose: verbose || !all,
                debug: cli.debug,
            };
            let ctx = build_context(cli.root.as_deref(), flags, jobs)?;
            add_version::add_version(&ctx, package.as_deref(), overwrite_version, keep_going || all)
        }
        Command::Completion { shell } => completion::completion(shell),
    }
}

#[derive(Debug, Clone, Copy)]
struct OutputFlags {
    quiet: bool,
    verbose: bool,
    debug: bool,
}

/// Resolve root, configuration and flags into an engine context.
fn build_context(root: Option<&Path>, flags: OutputFlags, jobs: Option<usize>) -> Result<Context> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => discover_root()?,
    };

    let loaded = Config::load(Some(&root)).context("failed to load configuration")?;
    let verbosity = Verbosity::from_flags(
        flags.quiet,
        flags.verbose || loaded.config.verbose(),
        flags.debug,
    );

    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }
    if let Some(path) = loaded.config.global_config_loaded_from() {
        output::debug(format!("global config: {}", path.display()), verbosity);
    }
    if let Some(path) = loaded.config.registry_config_loaded_from() {
        output::debug(format!("registry config: {}", path.display()), verbosity);
    }

    let ctx = Context::new(root, &loaded.config, verbosity, jobs);
    output::debug(format!("registry root: {}", ctx.paths.root.display()), verbosity);
    Ok(ctx)
}

fn discover_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let git = Git::open(&cwd).context("run inside a registry checkout or pass --root")?;
    Ok(git.work_dir()?.to_path_buf())
}
