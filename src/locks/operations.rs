//! Lock acquisition.

use super::guard::LockHandle;
use super::primitive::{ExclusiveOnly, NativeLocker, RangeLocker};
use super::types::{LockMode, LockRange};
use crate::config::{Config, DEFAULT_SHARED_LOCK_PROBE_LIMIT};
use crate::error::{LockdownError, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Byte coordinated by every shared request before it settles.
const HEAD: LockRange = LockRange::byte(0);

/// Acquires advisory locks on existing files.
///
/// Stateless apart from its primitive and probe ceiling; one instance can
/// serve any number of callers.
#[derive(Debug, Clone)]
pub struct AdvisoryLocker {
    locker: Arc<dyn RangeLocker>,
    probe_limit: u64,
}

impl AdvisoryLocker {
    /// Create a locker over `locker` that probes at most `probe_limit` slots.
    pub fn new(locker: Arc<dyn RangeLocker>, probe_limit: u64) -> Self {
        Self {
            locker,
            probe_limit,
        }
    }

    /// Create a locker using the platform primitive and default settings.
    pub fn for_platform() -> Self {
        Self::new(Arc::new(NativeLocker), DEFAULT_SHARED_LOCK_PROBE_LIMIT)
    }

    /// Create a locker honoring `config`.
    pub fn from_config(config: &Config) -> Self {
        let locker: Arc<dyn RangeLocker> = if config.emulate_shared_locks {
            Arc::new(ExclusiveOnly(NativeLocker))
        } else {
            Arc::new(NativeLocker)
        };
        Self::new(locker, config.shared_lock_probe_limit)
    }

    /// Slot positions a shared request may try before giving up.
    pub fn probe_limit(&self) -> u64 {
        self.probe_limit
    }

    /// Lock `path`.
    ///
    /// * Exclusive (`shared == false`): the whole file. Waits if `allow_block`,
    ///   otherwise fails with `LockUnavailable` when the lock is taken.
    /// * Shared: always waits, whatever `allow_block` says. Byte 0 is locked
    ///   shared; if the primitive grants it as shared the handle keeps it.
    ///   Otherwise the first free byte from 1 upward is locked exclusively as
    ///   this holder's slot, and byte 0 is let go.
    ///
    /// # Errors
    ///
    /// * `PathNotFound` - `path` does not exist
    /// * `NotAPlainFile` - `path` is a directory or another non-regular file
    /// * `LockUnavailable` - non-blocking exclusive request denied
    /// * `LockSlotsExhausted` - every slot within the probe limit is taken
    /// * `LockIoError` - the file could not be opened or the primitive failed
    pub fn acquire<P: AsRef<Path>>(
        &self,
        path: P,
        shared: bool,
        allow_block: bool,
    ) -> Result<LockHandle> {
        let path = path.as_ref();
        let file = open_for_locking(path)?;

        let locked = if shared {
            self.lock_shared(&file, path)
        } else {
            self.lock_exclusive(&file, path, allow_block)
        };

        match locked {
            Ok((range, mode)) => Ok(LockHandle::new(
                file,
                path.to_path_buf(),
                range,
                mode,
                Arc::clone(&self.locker),
            )),
            Err(e) => {
                self.locker.retire(file);
                Err(e)
            }
        }
    }

    fn lock_exclusive(
        &self,
        file: &File,
        path: &Path,
        allow_block: bool,
    ) -> Result<(LockRange, LockMode)> {
        let range = LockRange::WHOLE_FILE;

        let granted = if allow_block {
            self.locker
                .lock(file, range, LockMode::Exclusive)
                .map_err(|e| lock_io_error(path, e))?
        } else {
            self.locker
                .try_lock(file, range, LockMode::Exclusive)
                .map_err(|e| lock_io_error(path, e))?
                .ok_or_else(|| LockdownError::LockUnavailable {
                    path: path.to_path_buf(),
                })?
        };

        debug!(path = %path.display(), %range, "acquired exclusive lock");
        Ok((range, granted))
    }

    fn lock_shared(&self, file: &File, path: &Path) -> Result<(LockRange, LockMode)> {
        let granted = self
            .locker
            .lock(file, HEAD, LockMode::Shared)
            .map_err(|e| lock_io_error(path, e))?;

        if granted == LockMode::Shared {
            debug!(path = %path.display(), range = %HEAD, "acquired shared lock");
            return Ok((HEAD, LockMode::Shared));
        }

        debug!(path = %path.display(), "shared lock came back exclusive, probing for a slot");
        match self.probe_slot(file, path) {
            Ok(Some(slot)) => {
                self.locker
                    .unlock(file, HEAD)
                    .map_err(|e| lock_io_error(path, e))?;
                debug!(path = %path.display(), range = %slot, "acquired shared slot");
                Ok((slot, LockMode::Shared))
            }
            Ok(None) => {
                self.locker
                    .unlock(file, HEAD)
                    .map_err(|e| lock_io_error(path, e))?;
                Err(LockdownError::LockSlotsExhausted {
                    path: path.to_path_buf(),
                    limit: self.probe_limit,
                })
            }
            Err(e) => {
                let _ = self.locker.unlock(file, HEAD);
                Err(e)
            }
        }
    }

    /// Find and lock the first free single-byte slot in `1..=probe_limit`.
    fn probe_slot(&self, file: &File, path: &Path) -> Result<Option<LockRange>> {
        for position in 1..=self.probe_limit {
            let slot = LockRange::byte(position);
            if self
                .locker
                .try_lock(file, slot, LockMode::Exclusive)
                .map_err(|e| lock_io_error(path, e))?
                .is_some()
            {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }
}

impl Default for AdvisoryLocker {
    fn default() -> Self {
        Self::for_platform()
    }
}

/// Lock `path` with the platform primitive and default settings.
///
/// See [`AdvisoryLocker::acquire`].
pub fn acquire<P: AsRef<Path>>(path: P, shared: bool, allow_block: bool) -> Result<LockHandle> {
    AdvisoryLocker::for_platform().acquire(path, shared, allow_block)
}

/// Open an existing regular file for locking. Never creates it.
fn open_for_locking(path: &Path) -> Result<File> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LockdownError::PathNotFound {
            path: path.to_path_buf(),
        },
        _ => lock_io_error(path, e),
    })?;
    if !meta.is_file() {
        return Err(LockdownError::NotAPlainFile {
            path: path.to_path_buf(),
        });
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LockdownError::PathNotFound {
                path: path.to_path_buf(),
            },
            _ => lock_io_error(path, e),
        })
}

fn lock_io_error(path: &Path, source: io::Error) -> LockdownError {
    LockdownError::LockIoError {
        path: path.to_path_buf(),
        source,
    }
}
