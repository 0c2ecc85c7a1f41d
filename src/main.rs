//! Lockdown CLI.
//!
//! This is the main entry point for the `lockdown` CLI. It parses arguments,
//! sets up logging, loads the configuration, dispatches to the appropriate
//! command handler, and handles errors with proper exit codes.

mod cli;
mod commands;

use anyhow::Context;
use cli::Cli;
use lockdown::config::Config;
use lockdown::error::LockdownError;
use lockdown::exit_codes;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {:#}", err);

            let code = err
                .downcast_ref::<LockdownError>()
                .map_or(exit_codes::USER_ERROR, LockdownError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => Config::default(),
    };

    Ok(commands::dispatch(cli.command, &config)?)
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
