//! RAII lock handle.

use super::primitive::RangeLocker;
use super::types::{LockMode, LockRange};
use crate::error::{LockdownError, Result};
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::fs::File;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A held advisory lock.
///
/// The lock covers [`range`](Self::range) of the open file and is released
/// when the handle is dropped. If the release fails during drop, a warning is
/// logged but no panic occurs. Use [`release`](Self::release) to see the error.
#[derive(Debug)]
pub struct LockHandle {
    file: ManuallyDrop<File>,
    path: PathBuf,
    range: LockRange,
    exclusive: bool,
    acquired_at: DateTime<Utc>,
    locker: Arc<dyn RangeLocker>,
    released: bool,
}

impl LockHandle {
    pub(super) fn new(
        file: File,
        path: PathBuf,
        range: LockRange,
        mode: LockMode,
        locker: Arc<dyn RangeLocker>,
    ) -> Self {
        Self {
            file: ManuallyDrop::new(file),
            path,
            range,
            exclusive: mode == LockMode::Exclusive,
            acquired_at: Utc::now(),
            locker,
            released: false,
        }
    }

    /// Path of the locked file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte range actually held.
    ///
    /// [`LockRange::WHOLE_FILE`] for true locks; a single byte for a shared
    /// request that fell back to slot probing.
    pub fn range(&self) -> LockRange {
        self.range
    }

    /// Whether the held lock is exclusive.
    ///
    /// A slot lock from the shared fallback reports `false` even though the
    /// underlying byte lock is exclusive: it excludes whole-file writers but
    /// coexists with other slot holders.
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn is_shared(&self) -> bool {
        !self.exclusive
    }

    pub fn mode(&self) -> LockMode {
        if self.exclusive {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        }
    }

    /// When the lock was granted.
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// How long the lock has been held.
    pub fn held_for(&self) -> Duration {
        Utc::now().signed_duration_since(self.acquired_at)
    }

    /// Human-readable hold time (e.g., "5m", "2h 30m", "1d 3h").
    pub fn held_for_string(&self) -> String {
        let held = self.held_for();
        let minutes = held.num_minutes();
        let hours = held.num_hours();
        let days = held.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", held.num_seconds())
        }
    }

    /// The open file the lock is held through.
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Release the lock now, reporting any failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.locker
            .unlock(&self.file, self.range)
            .map_err(|e| LockdownError::LockIoError {
                path: self.path.clone(),
                source: e,
            })?;
        debug!(path = %self.path.display(), range = %self.range, "released lock");
        Ok(())
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if !self.released {
            match self.locker.unlock(&self.file, self.range) {
                Ok(()) => {
                    debug!(path = %self.path.display(), range = %self.range, "released lock")
                }
                Err(e) => warn!(
                    path = %self.path.display(),
                    range = %self.range,
                    error = %e,
                    "failed to release lock"
                ),
            }
        }

        // SAFETY: `file` is taken exactly once, here, and never used afterwards.
        let file = unsafe { ManuallyDrop::take(&mut self.file) };
        self.locker.retire(file);
    }
}

impl fmt::Display for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} lock, {}, held: {})",
            self.path.display(),
            self.mode(),
            self.range,
            self.held_for_string()
        )
    }
}
