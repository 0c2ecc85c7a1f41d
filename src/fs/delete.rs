//! Parent-directory creation and deletion helpers.
//!
//! `recursive_delete` is confined to a base directory: both paths are
//! canonicalized and compared component-wise, so neither `..` segments nor
//! symlinks nor a sibling sharing the base's name as a string prefix
//! (`/cache` vs `/cache2`) can take it outside the base.

use crate::error::{LockdownError, Result};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Create the missing ancestor directories of `path`.
///
/// Succeeds if the parent already exists as a directory.
pub fn create_parent_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    if parent.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|e| LockdownError::Io {
        action: "could not create directory",
        path: parent.to_path_buf(),
        source: e,
    })
}

/// Delete `path` if it exists; a failure is logged as a warning, not returned.
///
/// Returns whether the path is gone afterwards.
pub fn delete_with_warning<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    let Ok(meta) = fs::symlink_metadata(path) else {
        return true;
    };

    let result = if meta.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not delete");
            false
        }
    }
}

/// Recursively delete `path` (file or directory), refusing to touch anything
/// outside `base`.
///
/// Symlinks inside the tree are removed, never followed.
pub fn recursive_delete<P: AsRef<Path>, B: AsRef<Path>>(path: P, base: B) -> Result<()> {
    let base = base.as_ref();
    let canonical_base = base
        .canonicalize()
        .map_err(|e| LockdownError::CanonicalizationFailed {
            path: base.to_path_buf(),
            source: e,
        })?;

    delete_within(path.as_ref(), &canonical_base)
}

fn delete_within(path: &Path, canonical_base: &Path) -> Result<()> {
    debug!(path = %path.display(), "deleting");

    let canonical = canonical_location(path)?;
    if !canonical.starts_with(canonical_base) {
        return Err(LockdownError::OutsideBase {
            path: canonical,
            base: canonical_base.to_path_buf(),
        });
    }

    let meta = fs::symlink_metadata(path).map_err(|e| delete_failed(path, e))?;

    if meta.is_dir() {
        let entries = fs::read_dir(path).map_err(|e| delete_failed(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| delete_failed(path, e))?;
            delete_within(&entry.path(), canonical_base)?;
        }
        fs::remove_dir(path).map_err(|e| delete_failed(path, e))
    } else {
        fs::remove_file(path).map_err(|e| delete_failed(path, e))
    }
}

/// Canonical location of `path` itself: a symlink resolves its parent only, so
/// the check applies to where the link lives, not where it points.
fn canonical_location(path: &Path) -> Result<std::path::PathBuf> {
    let is_symlink = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .map_err(|e| LockdownError::CanonicalizationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    if !is_symlink {
        return path
            .canonicalize()
            .map_err(|e| LockdownError::CanonicalizationFailed {
                path: path.to_path_buf(),
                source: e,
            });
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path.file_name().unwrap_or_default();
    parent
        .canonicalize()
        .map(|p| p.join(name))
        .map_err(|e| LockdownError::CanonicalizationFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn delete_failed(path: &Path, source: io::Error) -> LockdownError {
    LockdownError::DeleteFailed {
        path: path.to_path_buf(),
        source,
    }
}
