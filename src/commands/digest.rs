//! Implementation of the `lockdown digest` command.

use crate::cli::DigestArgs;
use lockdown::error::Result;
use lockdown::exit_codes;
use lockdown::fs::file_digest;

/// Execute the `lockdown digest` command.
///
/// Prints `<hex>  <path>` like the coreutils `*sum` tools.
pub fn cmd_digest(args: DigestArgs) -> Result<i32> {
    let sum = file_digest(&args.path, args.algorithm)?;
    println!("{}  {}", sum, args.path.display());
    Ok(exit_codes::SUCCESS)
}
