//! Implementation of the `lockdown delete` command.

use crate::cli::DeleteArgs;
use lockdown::error::Result;
use lockdown::exit_codes;
use lockdown::fs::recursive_delete;

/// Execute the `lockdown delete` command.
pub fn cmd_delete(args: DeleteArgs) -> Result<i32> {
    recursive_delete(&args.path, &args.base)?;
    println!("Deleted {}", args.path.display());
    Ok(exit_codes::SUCCESS)
}
