//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--root <path>`: Registry root (default: enclosing git work tree)
//! - `--debug`: Print diagnostics to stderr
//! - `--quiet` / `-q`: Errors only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// portledger - Keep package version history and the baseline consistent
#[derive(Parser, Debug)]
#[command(name = "portledger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Registry root; defaults to the git work tree containing the current directory
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Print diagnostics to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check every package's ledger and baseline entry
    #[command(
        name = "verify",
        long_about = "Check every package's ledger and baseline entry.\n\n\
            For each package under the ports directory, the declared version must be \
            the current entry of its ledger, the package files must match the recorded \
            content id, and the baseline must endorse the same version. Every package \
            is checked and all failures are reported; nothing is modified.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Check the whole registry
    portledger verify

    # Show a line for every package that passes
    portledger verify --verbose

    # Also check every ledger entry against the recorded history (slow)
    portledger verify --verify-git-trees

    # Skip packages known to be broken
    portledger verify --exclude zlib,curl"
    )]
    Verify {
        /// Packages to skip (comma-separated; adds to the configured list)
        #[arg(long, value_delimiter = ',', value_name = "PACKAGE")]
        exclude: Vec<String>,

        /// Check every ledger entry against the content it records
        #[arg(long)]
        verify_git_trees: bool,

        /// Print a line for every package that passes
        #[arg(short, long)]
        verbose: bool,

        /// Worker threads
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Record a package's declared version in its ledger and the baseline
    #[command(
        name = "add-version",
        long_about = "Record a package's declared version in its ledger and the baseline.\n\n\
            Reads the package manifest, hashes the package directory, and adds a new \
            current entry to the ledger. Re-running with no changes does nothing. \
            Republishing an existing version with different files requires \
            --overwrite-version. Bumping the version without changing the files is \
            always refused.",
        after_help = "\
WORKFLOW EXAMPLES:
    # After editing ports/zlib and bumping its version
    portledger add-version zlib

    # Fix the files of an already recorded version
    portledger add-version zlib --overwrite-version

    # Update every package, reporting failures at the end
    portledger add-version --all"
    )]
    AddVersion {
        /// Package to update
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        package: Option<String>,

        /// Update every package (implies --keep-going)
        #[arg(long)]
        all: bool,

        /// Replace the recorded files of an existing version
        #[arg(long)]
        overwrite_version: bool,

        /// Continue with the next package after a failure
        #[arg(long)]
        keep_going: bool,

        /// Print what was recorded for each package
        #[arg(short, long)]
        verbose: bool,

        /// Worker threads
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    portledger completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    portledger completion zsh >> ~/.zshrc

    # Fish
    portledger completion fish > ~/.config/fish/completions/portledger.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
