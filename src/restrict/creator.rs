//! The staging/lockdown/rename procedure.

use super::request::{CreationRequest, ObjectKind};
use super::strategy::{PermissionLockdownStrategy, platform_strategy};
use crate::config::Config;
use crate::error::{LockdownError, Result};
use crate::fs::{
    canonicalize_lenient, delete_with_warning, is_cross_device_rename, rename_no_replace,
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Suffix appended to the target name to form the staging name.
pub const STAGING_SUFFIX: &str = ".temp";

/// Creates owner-only files and directories.
///
/// Stateless apart from its strategy; one instance can serve any number of
/// calls from any thread.
#[derive(Debug, Clone)]
pub struct RestrictedFileCreator {
    strategy: Arc<dyn PermissionLockdownStrategy>,
}

impl RestrictedFileCreator {
    /// Create a creator that locks objects down with `strategy`.
    pub fn new(strategy: Arc<dyn PermissionLockdownStrategy>) -> Self {
        Self { strategy }
    }

    /// Create a creator using the running platform's strategy.
    pub fn for_platform() -> Self {
        Self::new(platform_strategy())
    }

    /// Name of the lockdown strategy in use.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Create the object described by `request`.
    ///
    /// # Errors
    ///
    /// * `AlreadyExists` - something (even a dangling symlink) is at the target
    /// * `CanonicalizationFailed` - the target's parent directory cannot be resolved
    /// * `CreateFailed` - the staging (or, with restrictions disabled, final) object
    ///   could not be created, including when a stale staging object is in the way
    /// * `PermissionLockdownFailed` - the strategy could not restrict the staging object
    /// * `RenameFailed` - the staging object could not be moved to the target,
    ///   including when the target appeared in the meantime
    pub fn create(&self, request: &CreationRequest) -> Result<()> {
        let target = request.path();
        let kind = request.kind();

        if fs::symlink_metadata(target).is_ok() {
            return Err(LockdownError::AlreadyExists {
                path: target.to_path_buf(),
            });
        }

        if request.restrictions_disabled() {
            debug!(path = %target.display(), %kind, "restricted files disabled, creating directly");
            return create_object(target, kind).map_err(|e| create_failed(target, e));
        }

        let final_path = canonicalize_lenient(target)?;
        let staging = staging_path(&final_path);

        create_object(&staging, kind).map_err(|e| create_failed(&staging, e))?;
        debug!(staging = %staging.display(), %kind, "created staging object");

        if let Err(e) = self
            .strategy
            .lock_down(&staging, kind, request.writable_by_owner())
        {
            discard_staging(&staging);
            return Err(LockdownError::PermissionLockdownFailed {
                path: staging,
                source: e,
            });
        }
        debug!(
            staging = %staging.display(),
            strategy = self.strategy.name(),
            writable = request.writable_by_owner(),
            "locked down staging object"
        );

        if let Err(e) = rename_no_replace(&staging, &final_path) {
            if is_cross_device_rename(&e) {
                warn!(
                    staging = %staging.display(),
                    target = %final_path.display(),
                    "staging object landed on a different filesystem than the target"
                );
            }
            discard_staging(&staging);
            return Err(LockdownError::RenameFailed {
                from: staging,
                to: final_path,
                source: e,
            });
        }
        debug!(path = %final_path.display(), "restricted {} in place", kind);

        Ok(())
    }
}

impl Default for RestrictedFileCreator {
    fn default() -> Self {
        Self::for_platform()
    }
}

/// The staging path for `target`: same directory, name plus [`STAGING_SUFFIX`].
pub fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}

/// Create a restricted file at `path`, honoring `config`.
///
/// The owner can always read it and can write it only if `writable_by_owner`.
pub fn create_restricted_file<P: AsRef<Path>>(
    path: P,
    writable_by_owner: bool,
    config: &Config,
) -> Result<()> {
    let request = CreationRequest::file(path.as_ref(), writable_by_owner).with_config(config);
    RestrictedFileCreator::for_platform().create(&request)
}

/// Create a restricted directory at `path`, honoring `config`.
///
/// Parent directories are not created; they must already exist.
pub fn create_restricted_directory<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let request = CreationRequest::directory(path.as_ref()).with_config(config);
    RestrictedFileCreator::for_platform().create(&request)
}

/// Create a new file or directory, never reusing an existing one.
fn create_object(path: &Path, kind: ObjectKind) -> io::Result<()> {
    match kind {
        ObjectKind::Directory => fs::create_dir(path),
        ObjectKind::File => OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop),
    }
}

fn create_failed(path: &Path, source: io::Error) -> LockdownError {
    LockdownError::CreateFailed {
        path: path.to_path_buf(),
        source,
    }
}

fn discard_staging(staging: &Path) {
    if !delete_with_warning(staging) {
        warn!(staging = %staging.display(), "orphaned staging object left behind");
    }
}
