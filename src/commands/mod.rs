//! Command implementations for lockdown.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each handler returns the process exit code on success;
//! failures are `LockdownError`s that carry their own exit code.

mod create;
mod delete;
mod digest;
mod init_config;
mod lock;
mod probe;
mod show_path;

use crate::cli::Command;
use lockdown::config::Config;
use lockdown::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command, config: &Config) -> Result<i32> {
    match command {
        Command::Create(args) => create::cmd_create(args, config),
        Command::Probe(args) => probe::cmd_probe(args),
        Command::CheckDir(args) => probe::cmd_check_dir(args),
        Command::Lock(args) => lock::cmd_lock(args, config),
        Command::Delete(args) => delete::cmd_delete(args),
        Command::ShowPath(args) => show_path::cmd_show_path(args, config),
        Command::Digest(args) => digest::cmd_digest(args),
        Command::InitConfig(args) => init_config::cmd_init_config(args),
    }
}
