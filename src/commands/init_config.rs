//! Implementation of the `lockdown init-config` command.

use crate::cli::InitConfigArgs;
use lockdown::config::Config;
use lockdown::error::{LockdownError, Result};
use lockdown::exit_codes;

/// Execute the `lockdown init-config` command.
///
/// Writes `Config::default()` so every setting is visible and editable.
pub fn cmd_init_config(args: InitConfigArgs) -> Result<i32> {
    if args.path.exists() && !args.force {
        return Err(LockdownError::UserError(format!(
            "'{}' already exists.\n\n\
             Fix: pass --force to overwrite it.",
            args.path.display()
        )));
    }

    Config::default().save(&args.path)?;
    println!("Wrote default configuration to {}", args.path.display());
    Ok(exit_codes::SUCCESS)
}
