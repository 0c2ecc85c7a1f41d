//! Implementation of the `lockdown probe` and `lockdown check-dir` commands.

use crate::cli::{CheckDirArgs, ProbeArgs};
use lockdown::error::{LockdownError, Result};
use lockdown::exit_codes;
use lockdown::probe::{test_directory, test_file};
use serde_json::json;

/// Execute the `lockdown probe` command.
pub fn cmd_probe(args: ProbeArgs) -> Result<i32> {
    let result = test_file(&args.path);

    if args.json {
        let out = json!({
            "path": args.path.display().to_string(),
            "result": result,
        });
        println!("{}", to_pretty(&out)?);
    } else {
        println!("{}: {}", args.path.display(), result);
    }

    Ok(if result.is_success() {
        exit_codes::SUCCESS
    } else {
        exit_codes::PROBE_FAILURE
    })
}

/// Execute the `lockdown check-dir` command.
pub fn cmd_check_dir(args: CheckDirArgs) -> Result<i32> {
    let results = test_directory(&args.path)?;

    if args.json {
        println!("{}", to_pretty(&results)?);
    } else {
        println!("{}", results);
    }

    Ok(if results.passed() {
        exit_codes::SUCCESS
    } else {
        exit_codes::PROBE_FAILURE
    })
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LockdownError::UserError(format!("failed to serialize output: {}", e)))
}
