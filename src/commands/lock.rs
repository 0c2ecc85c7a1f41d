//! Implementation of the `lockdown lock` command.

use crate::cli::LockArgs;
use lockdown::config::Config;
use lockdown::error::{LockdownError, Result};
use lockdown::exit_codes;
use lockdown::locks::AdvisoryLocker;
use std::process::Command;
use tracing::info;

/// Execute the `lockdown lock` command.
///
/// Without `--command` the lock is acquired, reported and released. With it,
/// the command runs while the lock is held and its exit code is returned.
pub fn cmd_lock(args: LockArgs, config: &Config) -> Result<i32> {
    // Parsed up front: a malformed command must not wait on the lock.
    let argv = args.command.as_deref().map(parse_command).transpose()?;

    let locker = AdvisoryLocker::from_config(config);
    let handle = locker.acquire(&args.path, args.shared, !args.no_wait)?;

    let Some(argv) = argv else {
        println!("Acquired {}", handle);
        handle.release()?;
        return Ok(exit_codes::SUCCESS);
    };

    info!(lock = %handle, command = ?argv, "running command under lock");
    let status = Command::new(&argv[0]).args(&argv[1..]).status();
    handle.release()?;

    let status = status.map_err(|e| {
        LockdownError::UserError(format!(
            "failed to execute '{}': {}\n\n\
             Fix: ensure the command is installed and in PATH.",
            argv[0], e
        ))
    })?;

    Ok(status.code().unwrap_or(exit_codes::USER_ERROR))
}

/// Split a command line into argv without invoking a shell.
fn parse_command(command: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(command).map_err(|e| {
        LockdownError::UserError(format!(
            "failed to parse command '{}': {}\n\n\
             Fix: check for unmatched quotes or invalid escape sequences.",
            command, e
        ))
    })?;

    if argv.is_empty() {
        return Err(LockdownError::UserError(
            "command is empty after parsing".to_string(),
        ));
    }

    Ok(argv)
}
