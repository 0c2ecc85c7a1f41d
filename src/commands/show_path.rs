//! Implementation of the `lockdown show-path` command.

use crate::cli::ShowPathArgs;
use lockdown::config::Config;
use lockdown::error::Result;
use lockdown::exit_codes;
use lockdown::fs::{SANITIZED_CHAR, displayable_path, sanitize_path};

/// Execute the `lockdown show-path` command.
pub fn cmd_show_path(args: ShowPathArgs, config: &Config) -> Result<i32> {
    let width = args.width.unwrap_or(config.display_path_width);
    let path = if args.sanitize {
        sanitize_path(&args.path, SANITIZED_CHAR)
    } else {
        args.path
    };

    println!("{}", displayable_path(&path, width));
    Ok(exit_codes::SUCCESS)
}
