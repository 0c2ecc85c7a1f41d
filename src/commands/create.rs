//! Implementation of the `lockdown create` command.

use crate::cli::CreateArgs;
use lockdown::config::Config;
use lockdown::error::Result;
use lockdown::exit_codes;
use lockdown::restrict::{CreationRequest, RestrictedFileCreator};

/// Execute the `lockdown create` command.
pub fn cmd_create(args: CreateArgs, config: &Config) -> Result<i32> {
    let request = if args.dir {
        CreationRequest::directory(&args.path)
    } else {
        CreationRequest::file(&args.path, !args.read_only)
    }
    .with_config(config);

    let creator = RestrictedFileCreator::for_platform();
    creator.create(&request)?;

    let what = if args.dir { "directory" } else { "file" };
    if request.restrictions_disabled() {
        println!("Created {}: {} (restrictions disabled)", what, args.path.display());
    } else {
        let access = if args.dir || !args.read_only {
            "owner read/write"
        } else {
            "owner read-only"
        };
        println!(
            "Created restricted {}: {} ({}, {})",
            what,
            args.path.display(),
            access,
            creator.strategy_name()
        );
    }

    Ok(exit_codes::SUCCESS)
}
