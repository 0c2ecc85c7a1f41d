//! Atomic text file save and load.
//!
//! Saving follows the same pattern as restricted creation:
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Rename it over the target
//!
//! A reader therefore sees either the old content or the new content, never a
//! partially written file. Source and destination share a directory, so the
//! rename stays on one filesystem/volume.
//!
//! On crash, a temporary file may remain (named `.{filename}.tmp`).

use crate::error::{LockdownError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically save a string to `path` as UTF-8, replacing any existing content.
///
/// The parent directory must already exist.
///
/// # Example
///
/// ```no_run
/// use lockdown::fs::save_file;
///
/// save_file("policy.txt", "grant {};\n")?;
/// # Ok::<(), lockdown::error::LockdownError>(())
/// ```
pub fn save_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content.as_bytes())?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LockdownError::Io {
            action: "failed to atomically replace",
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    // Persist the directory entry as well (opening a directory fails on Windows).
    if let Some(parent) = path.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Read a whole UTF-8 text file into a string.
///
/// Line endings are normalized: `\r\n` and lone `\r` become `\n`, and a
/// non-empty result always ends with `\n`.
pub fn load_file_as_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| LockdownError::Io {
        action: "failed to read",
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(normalize_line_endings(&raw))
}

fn normalize_line_endings(text: &str) -> String {
    let mut unified = text.replace("\r\n", "\n").replace('\r', "\n");
    if !unified.is_empty() && !unified.ends_with('\n') {
        unified.push('\n');
    }
    unified
}

/// Generate a temporary file path in the same directory as the target.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            LockdownError::UserError(format!("invalid file path '{}'", target.display()))
        })?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

/// Write content to a file and sync to disk.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let io_err = |action, source| LockdownError::Io {
        action,
        path: path.to_path_buf(),
        source,
    };

    let mut file =
        File::create(path).map_err(|e| io_err("failed to create temporary file", e))?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        io_err("failed to write temporary file", e)
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        io_err("failed to sync temporary file", e)
    })?;

    Ok(())
}
