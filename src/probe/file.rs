//! Path probes: is this file usable, is this file's directory usable.

use super::directory::{DirectoryCheckResults, DirectoryValidator};
use crate::error::{LockdownError, Result};
use crate::fs::access::{can_read, can_write};
use crate::fs::canonicalize_lenient;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use tracing::debug;

/// Whether an existing path can be used as a read/write file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenFileResult {
    /// A plain file the current user can read and write.
    Success,
    /// Unusable for a reason not covered below.
    Failure,
    /// The file was absent and could not be created.
    CantCreate,
    /// Readable only.
    CantWrite,
    /// Not a plain file (a directory).
    NotAFile,
}

impl OpenFileResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenFileResult::Success => "success",
            OpenFileResult::Failure => "failure",
            OpenFileResult::CantCreate => "cant_create",
            OpenFileResult::CantWrite => "cant_write",
            OpenFileResult::NotAFile => "not_a_file",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == OpenFileResult::Success
    }
}

impl fmt::Display for OpenFileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check the directory that would hold `path`.
///
/// `path` is canonicalized first (it need not exist itself); its parent must
/// exist. The parent is then validated with [`DirectoryValidator`].
///
/// # Errors
///
/// * `CanonicalizationFailed` - `path` cannot be resolved
/// * `PathNotFound` - `path` has no parent, or the parent does not exist
pub fn test_directory<P: AsRef<Path>>(path: P) -> Result<DirectoryCheckResults> {
    let path = path.as_ref();
    let canonical = canonicalize_lenient(path)?;

    let parent = canonical
        .parent()
        .filter(|p| p.exists())
        .ok_or_else(|| LockdownError::PathNotFound {
            path: canonical.parent().unwrap_or(&canonical).to_path_buf(),
        })?;

    let results = DirectoryValidator::new([parent]).ensure_dirs();
    debug!(
        path = %parent.display(),
        failures = results.failures(),
        "checked directory"
    );
    Ok(results)
}

/// Classify whether `path` is a usable read/write file.
///
/// Every check is evaluated once; nothing is retried.
pub fn test_file<P: AsRef<Path>>(path: P) -> OpenFileResult {
    let path = path.as_ref();
    let result = classify(path);
    debug!(path = %path.display(), %result, "probed file");
    result
}

fn classify(path: &Path) -> OpenFileResult {
    if !path.exists() {
        return OpenFileResult::Failure;
    }

    let Ok(canonical) = path.canonicalize() else {
        return OpenFileResult::Failure;
    };

    match test_directory(&canonical) {
        Ok(results) if results.passed() => {}
        _ => return OpenFileResult::Failure,
    }

    if canonical.is_dir() {
        return OpenFileResult::NotAFile;
    }

    if create_if_absent(&canonical).is_err() {
        return OpenFileResult::CantCreate;
    }

    match (can_read(&canonical), can_write(&canonical)) {
        (true, true) => OpenFileResult::Success,
        (true, false) => OpenFileResult::CantWrite,
        _ => OpenFileResult::Failure,
    }
}

/// Create `path` as an empty file unless something is already there.
fn create_if_absent(path: &Path) -> io::Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}
