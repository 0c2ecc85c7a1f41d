//! CLI argument parsing for lockdown.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use lockdown::fs::DigestAlgorithm;
use std::path::PathBuf;

/// Lockdown: owner-restricted files and advisory file locks.
///
/// Creates files and directories only their owner can access, probes
/// whether paths are usable, and runs commands under advisory locks.
#[derive(Parser, Debug)]
#[command(name = "lockdown")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML configuration file (defaults apply when omitted).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log each step at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for lockdown.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a file or directory only its owner can access.
    ///
    /// The object is created under a staging name, restricted, then renamed
    /// into place. Fails if the path already exists.
    Create(CreateArgs),

    /// Check whether a path is a usable read/write file.
    ///
    /// Exits with code 3 unless the result is `success`.
    Probe(ProbeArgs),

    /// Check whether the directory holding a path is usable.
    ///
    /// Exits with code 3 if any check fails.
    CheckDir(CheckDirArgs),

    /// Hold an advisory lock on a file, optionally while running a command.
    ///
    /// With a command, exits with the command's exit code.
    Lock(LockArgs),

    /// Recursively delete a path, refusing anything outside a base directory.
    Delete(DeleteArgs),

    /// Print a path shortened for display.
    ShowPath(ShowPathArgs),

    /// Print the hex digest of a file's contents.
    Digest(DigestArgs),

    /// Write a configuration file holding the defaults.
    InitConfig(InitConfigArgs),
}

/// Arguments for the `create` command.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Path to create (must not exist; its parent must).
    pub path: PathBuf,

    /// Create a directory instead of a file.
    #[arg(long)]
    pub dir: bool,

    /// Do not let the owner write the file (ignored with --dir).
    #[arg(long)]
    pub read_only: bool,
}

/// Arguments for the `probe` command.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Path to probe.
    pub path: PathBuf,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check-dir` command.
#[derive(Parser, Debug)]
pub struct CheckDirArgs {
    /// Path whose parent directory is checked.
    pub path: PathBuf,

    /// Print the results as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `lock` command.
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Existing file to lock.
    pub path: PathBuf,

    /// Take a shared lock (always waits).
    #[arg(long)]
    pub shared: bool,

    /// Fail instead of waiting for an exclusive lock.
    #[arg(long)]
    pub no_wait: bool,

    /// Command to run while the lock is held (split like a shell, not run by one).
    #[arg(short, long)]
    pub command: Option<String>,
}

/// Arguments for the `delete` command.
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Path to delete.
    pub path: PathBuf,

    /// Directory the path must be inside.
    #[arg(long)]
    pub base: PathBuf,
}

/// Arguments for the `show-path` command.
#[derive(Parser, Debug)]
pub struct ShowPathArgs {
    /// Path to shorten.
    pub path: String,

    /// Visible characters (defaults to `display_path_width` from the config).
    #[arg(long)]
    pub width: Option<usize>,

    /// Replace characters that are invalid in file paths first.
    #[arg(long)]
    pub sanitize: bool,
}

/// Arguments for the `digest` command.
#[derive(Parser, Debug)]
pub struct DigestArgs {
    /// File to hash.
    pub path: PathBuf,

    /// MD5, SHA-1, SHA-256 or SHA-512.
    #[arg(short, long, default_value_t = DigestAlgorithm::Sha256)]
    pub algorithm: DigestAlgorithm,
}

/// Arguments for the `init-config` command.
#[derive(Parser, Debug)]
pub struct InitConfigArgs {
    /// Where to write the file.
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
