//! Platform byte-range lock primitives.
//!
//! - Linux: open-file-description locks (`F_OFD_SETLK`/`F_OFD_SETLKW`). They
//!   belong to the open file, so two handles in one process conflict exactly as
//!   two processes do, and closing an unrelated descriptor does not drop them.
//! - Other Unix: classic `fcntl` record locks (`F_SETLK`/`F_SETLKW`). They
//!   belong to the process, so a process-wide table of holders arbitrates
//!   between handles of this process and keeps descriptors open while another
//!   handle on the same file still holds a lock.
//! - Windows: `LockFileEx`/`UnlockFileEx`.
//!
//! All of these are advisory with respect to cooperating processes using the
//! same primitive.

use super::types::{LockMode, LockRange};
use std::fmt;
use std::fs::File;
use std::io;

/// A byte-range lock primitive on an open file.
pub trait RangeLocker: fmt::Debug + Send + Sync {
    /// Wait until `range` can be locked in `mode`.
    ///
    /// Returns the mode actually granted, which may be stronger than the one
    /// requested on primitives without shared locks.
    fn lock(&self, file: &File, range: LockRange, mode: LockMode) -> io::Result<LockMode>;

    /// Lock `range` in `mode` if that is possible right now.
    ///
    /// `Ok(None)` means the range is held by someone else.
    fn try_lock(&self, file: &File, range: LockRange, mode: LockMode)
    -> io::Result<Option<LockMode>>;

    /// Release `range`.
    fn unlock(&self, file: &File, range: LockRange) -> io::Result<()>;

    /// Close a file that was locked (or offered for locking) through this
    /// primitive.
    ///
    /// Primitives whose locks belong to the process rather than to the open
    /// file may hold on to it until no other handle on the same file is locked.
    fn retire(&self, file: File) {
        drop(file);
    }
}

/// The running platform's native primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLocker;

impl RangeLocker for NativeLocker {
    fn lock(&self, file: &File, range: LockRange, mode: LockMode) -> io::Result<LockMode> {
        imp::set_lock(file, range, Some(mode), true)?;
        Ok(mode)
    }

    fn try_lock(
        &self,
        file: &File,
        range: LockRange,
        mode: LockMode,
    ) -> io::Result<Option<LockMode>> {
        match imp::set_lock(file, range, Some(mode), false) {
            Ok(()) => Ok(Some(mode)),
            Err(e) if imp::is_contended(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn unlock(&self, file: &File, range: LockRange) -> io::Result<()> {
        imp::set_lock(file, range, None, false)
    }

    fn retire(&self, file: File) {
        imp::retire(file);
    }
}

/// Adapter for primitives without a usable shared lock: every request is
/// granted as exclusive, and says so.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExclusiveOnly<L>(pub L);

impl<L: RangeLocker> RangeLocker for ExclusiveOnly<L> {
    fn lock(&self, file: &File, range: LockRange, _mode: LockMode) -> io::Result<LockMode> {
        self.0.lock(file, range, LockMode::Exclusive)
    }

    fn try_lock(
        &self,
        file: &File,
        range: LockRange,
        _mode: LockMode,
    ) -> io::Result<Option<LockMode>> {
        self.0.try_lock(file, range, LockMode::Exclusive)
    }

    fn unlock(&self, file: &File, range: LockRange) -> io::Result<()> {
        self.0.unlock(file, range)
    }

    fn retire(&self, file: File) {
        self.0.retire(file);
    }
}

#[cfg(unix)]
mod imp {
    use super::{LockMode, LockRange};
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    /// Apply (`Some(mode)`) or remove (`None`) a lock on `range`.
    #[cfg(target_os = "linux")]
    pub(super) fn set_lock(
        file: &File,
        range: LockRange,
        mode: Option<LockMode>,
        wait: bool,
    ) -> io::Result<()> {
        let cmd = if wait {
            libc::F_OFD_SETLKW
        } else {
            libc::F_OFD_SETLK
        };
        fcntl_lock(file, range, lock_type(mode), cmd)
    }

    #[cfg(target_os = "linux")]
    pub(super) fn retire(file: File) {
        drop(file);
    }

    #[cfg(not(target_os = "linux"))]
    pub(super) use self::record::{retire, set_lock};

    /// Record locks arbitrated through the process-wide holder table.
    #[cfg(not(target_os = "linux"))]
    mod record {
        use super::{LockMode, LockRange, fcntl_lock, lock_type};
        use crate::locks::registry::{FileKey, ProcessLocks};
        use std::fs::File;
        use std::io;
        use std::os::unix::fs::MetadataExt;
        use std::os::unix::io::AsRawFd;
        use std::sync::{Condvar, LazyLock, Mutex, MutexGuard, PoisonError};
        use tracing::warn;

        struct Table {
            locks: Mutex<ProcessLocks<File>>,
            changed: Condvar,
        }

        static TABLE: LazyLock<Table> = LazyLock::new(|| Table {
            locks: Mutex::new(ProcessLocks::default()),
            changed: Condvar::new(),
        });

        fn locked() -> MutexGuard<'static, ProcessLocks<File>> {
            TABLE.locks.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn file_key(file: &File) -> io::Result<FileKey> {
            let meta = file.metadata()?;
            Ok((meta.dev(), meta.ino()))
        }

        pub(in crate::locks) fn set_lock(
            file: &File,
            range: LockRange,
            mode: Option<LockMode>,
            wait: bool,
        ) -> io::Result<()> {
            let key = file_key(file)?;
            let owner = file.as_raw_fd();

            let Some(mode) = mode else {
                return unlock_uncovered(file, key, range);
            };

            let mut locks = locked();
            while !locks.claim(key, owner, range, mode) {
                if !wait {
                    return Err(io::Error::from_raw_os_error(libc::EAGAIN));
                }
                locks = TABLE
                    .changed
                    .wait(locks)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            drop(locks);

            // The claim is recorded, so no other handle of this process can
            // touch the range while the kernel arbitrates with other processes.
            let cmd = if wait { libc::F_SETLKW } else { libc::F_SETLK };
            if let Err(e) = fcntl_lock(file, range, lock_type(Some(mode)), cmd) {
                if let Err(undo) = unlock_uncovered(file, key, range) {
                    warn!(error = %undo, "failed to drop an unused lock claim");
                }
                return Err(e);
            }
            Ok(())
        }

        /// Unlock the parts of `range` no other handle of this process holds.
        fn unlock_uncovered(file: &File, key: FileKey, range: LockRange) -> io::Result<()> {
            let mut locks = locked();
            let pieces = locks.release(key, file.as_raw_fd(), range);
            let result = pieces
                .into_iter()
                .try_for_each(|piece| fcntl_lock(file, piece, lock_type(None), libc::F_SETLK));
            drop(locks);
            TABLE.changed.notify_all();
            result
        }

        pub(in crate::locks) fn retire(file: File) {
            let Ok(key) = file_key(&file) else {
                return;
            };
            let owner = file.as_raw_fd();
            let closable = locked().retire(key, owner, file);
            drop(closable);
            TABLE.changed.notify_all();
        }
    }

    fn lock_type(mode: Option<LockMode>) -> libc::c_short {
        let lock_type = match mode {
            Some(LockMode::Shared) => libc::F_RDLCK,
            Some(LockMode::Exclusive) => libc::F_WRLCK,
            None => libc::F_UNLCK,
        };
        lock_type as libc::c_short
    }

    fn fcntl_lock(
        file: &File,
        range: LockRange,
        lock_type: libc::c_short,
        cmd: libc::c_int,
    ) -> io::Result<()> {
        // SAFETY: flock is plain old data; all-zero is a valid value (l_pid must
        // be 0 for open-file-description locks).
        let mut fl: libc::flock = unsafe { std::mem::zeroed() };
        fl.l_type = lock_type;
        fl.l_whence = libc::SEEK_SET as libc::c_short;
        fl.l_start = to_off_t(range.offset)?;
        // A zero length extends the lock to the end of the address space.
        fl.l_len = if range.len == u64::MAX {
            0
        } else {
            to_off_t(range.len)?
        };

        loop {
            // SAFETY: the descriptor is open for the lifetime of `file` and fl
            // is a valid flock.
            let rc = unsafe { libc::fcntl(file.as_raw_fd(), cmd, &mut fl) };
            if rc != -1 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub(super) fn is_contended(err: &io::Error) -> bool {
        matches!(err.raw_os_error(), Some(code) if code == libc::EAGAIN || code == libc::EACCES)
    }

    fn to_off_t(value: u64) -> io::Result<libc::off_t> {
        libc::off_t::try_from(value).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("lock offset {value} exceeds the platform file size limit"),
            )
        })
    }
}

#[cfg(windows)]
mod imp {
    use super::{LockMode, LockRange};
    use std::fs::File;
    use std::io;
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Foundation::{ERROR_LOCK_VIOLATION, HANDLE};
    use windows_sys::Win32::Storage::FileSystem::{
        LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx, UnlockFileEx,
    };
    use windows_sys::Win32::System::IO::OVERLAPPED;

    /// Apply (`Some(mode)`) or remove (`None`) a lock on `range`.
    pub(super) fn set_lock(
        file: &File,
        range: LockRange,
        mode: Option<LockMode>,
        wait: bool,
    ) -> io::Result<()> {
        let handle = file.as_raw_handle() as HANDLE;
        let len_low = range.len as u32;
        let len_high = (range.len >> 32) as u32;

        // SAFETY: OVERLAPPED is plain old data; zero is its documented initial
        // state, and the offset struct is the union variant LockFileEx reads.
        let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
        unsafe {
            overlapped.Anonymous.Anonymous.Offset = range.offset as u32;
            overlapped.Anonymous.Anonymous.OffsetHigh = (range.offset >> 32) as u32;
        }

        // SAFETY: handle is open for the lifetime of `file`; the file was opened
        // for synchronous I/O so the call completes before returning.
        let ok = unsafe {
            match mode {
                None => UnlockFileEx(handle, 0, len_low, len_high, &mut overlapped),
                Some(mode) => {
                    let mut flags = 0;
                    if mode == LockMode::Exclusive {
                        flags |= LOCKFILE_EXCLUSIVE_LOCK;
                    }
                    if !wait {
                        flags |= LOCKFILE_FAIL_IMMEDIATELY;
                    }
                    LockFileEx(handle, flags, 0, len_low, len_high, &mut overlapped)
                }
            }
        };

        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub(super) fn is_contended(err: &io::Error) -> bool {
        err.raw_os_error() == Some(ERROR_LOCK_VIOLATION as i32)
    }

    /// Locks belong to the handle, so closing it releases nothing else.
    pub(super) fn retire(file: File) {
        drop(file);
    }
}

#[cfg(not(any(unix, windows)))]
mod imp {
    use super::{LockMode, LockRange};
    use std::fs::File;
    use std::io;

    pub(super) fn set_lock(
        _file: &File,
        _range: LockRange,
        _mode: Option<LockMode>,
        _wait: bool,
    ) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "byte-range locks are not available on this platform",
        ))
    }

    pub(super) fn is_contended(_err: &io::Error) -> bool {
        false
    }

    pub(super) fn retire(file: File) {
        drop(file);
    }
}
