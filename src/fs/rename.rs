//! Rename without replacing.
//!
//! `std::fs::rename` silently replaces an existing destination file on every
//! platform, which would let an object that appeared at the final path be
//! clobbered (or, worse, let us believe we created it). This helper refuses to
//! replace anything.
//!
//! The check and the rename are a single atomic step wherever the platform
//! offers one:
//!
//! - Linux: `renameat2(RENAME_NOREPLACE)`
//! - macOS: `renamex_np(RENAME_EXCL)`
//! - Windows: `MoveFileExW` without `MOVEFILE_REPLACE_EXISTING`
//!
//! Filesystems that reject those flags, and other Unix platforms, move files
//! with `link` + `unlink`: `link` never replaces its target either. Only
//! directories on such filesystems, and platforms with neither, get an
//! existence check followed by a plain rename. That last fallback is not
//! atomic: a destination created between the check and the rename is replaced.
//!
//! Cross-device renames are reported as errors. A copy fallback would expose the
//! object under its final name before it is complete.

use std::fs;
use std::io;
use std::path::Path;

/// Move `from` to `to`, failing with [`io::ErrorKind::AlreadyExists`] if `to`
/// exists (including as a dangling symlink).
pub fn rename_no_replace<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> io::Result<()> {
    let from = from.as_ref();
    let to = to.as_ref();

    if native_rename_no_replace(from, to)? || link_rename(from, to)? {
        return Ok(());
    }

    checked_rename(from, to)
}

fn checked_rename(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(already_exists(to));
    }
    fs::rename(from, to)
}

fn already_exists(to: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("destination '{}' already exists", to.display()),
    )
}

#[cfg(unix)]
fn c_path(path: &Path) -> io::Result<std::ffi::CString> {
    use std::os::unix::ffi::OsStrExt;

    std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

/// Returns `Ok(true)` when the rename was performed natively, `Ok(false)` when
/// the platform or filesystem cannot do a no-replace rename.
#[cfg(target_os = "linux")]
fn native_rename_no_replace(from: &Path, to: &Path) -> io::Result<bool> {
    // From <linux/fs.h>.
    const RENAME_NOREPLACE: libc::c_uint = 1;

    let c_from = c_path(from)?;
    let c_to = c_path(to)?;

    // SAFETY: both pointers come from live NUL-terminated CStrings. The raw
    // syscall is used because not every libc exports a renameat2 wrapper.
    let rc = unsafe {
        libc::syscall(
            libc::SYS_renameat2,
            libc::AT_FDCWD,
            c_from.as_ptr(),
            libc::AT_FDCWD,
            c_to.as_ptr(),
            RENAME_NOREPLACE,
        )
    };
    if rc == 0 {
        return Ok(true);
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EINVAL) | Some(libc::ENOSYS) => Ok(false),
        _ => Err(err),
    }
}

#[cfg(target_os = "macos")]
fn native_rename_no_replace(from: &Path, to: &Path) -> io::Result<bool> {
    let c_from = c_path(from)?;
    let c_to = c_path(to)?;

    // SAFETY: both pointers come from live NUL-terminated CStrings.
    let rc = unsafe { libc::renamex_np(c_from.as_ptr(), c_to.as_ptr(), libc::RENAME_EXCL) };
    if rc == 0 {
        return Ok(true);
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ENOTSUP) | Some(libc::EINVAL) => Ok(false),
        _ => Err(err),
    }
}

#[cfg(windows)]
fn native_rename_no_replace(from: &Path, to: &Path) -> io::Result<bool> {
    use std::iter;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::MoveFileExW;

    let wide = |path: &Path| -> Vec<u16> {
        path.as_os_str()
            .encode_wide()
            .chain(iter::once(0))
            .collect()
    };
    let w_from = wide(from);
    let w_to = wide(to);

    // SAFETY: both buffers are NUL-terminated and outlive the call. Without
    // MOVEFILE_REPLACE_EXISTING an existing destination fails the move with
    // ERROR_ALREADY_EXISTS or ERROR_FILE_EXISTS.
    let ok = unsafe { MoveFileExW(w_from.as_ptr(), w_to.as_ptr(), 0) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(true)
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn native_rename_no_replace(_from: &Path, _to: &Path) -> io::Result<bool> {
    Ok(false)
}

/// Move a non-directory by linking it under `to` and unlinking `from`.
///
/// Returns `Ok(false)` for directories and filesystems without hard links.
#[cfg(unix)]
fn link_rename(from: &Path, to: &Path) -> io::Result<bool> {
    if fs::symlink_metadata(from)?.is_dir() {
        return Ok(false);
    }

    match fs::hard_link(from, to) {
        Ok(()) => {}
        Err(e) if links_unsupported(&e) => return Ok(false),
        Err(e) => return Err(e),
    }

    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(true)
}

#[cfg(unix)]
fn links_unsupported(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(code) if code == libc::EPERM
            || code == libc::ENOTSUP
            || code == libc::EOPNOTSUPP
            || code == libc::ENOSYS
            || code == libc::EMLINK
    )
}

#[cfg(not(unix))]
fn link_rename(_from: &Path, _to: &Path) -> io::Result<bool> {
    Ok(false)
}

/// Whether a rename failed because source and destination are on different
/// filesystems/volumes.
pub fn is_cross_device_rename(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::CrossesDevices || err.raw_os_error() == Some(CROSS_DEVICE_CODE)
}

#[cfg(unix)]
const CROSS_DEVICE_CODE: i32 = libc::EXDEV;

// ERROR_NOT_SAME_DEVICE
#[cfg(not(unix))]
const CROSS_DEVICE_CODE: i32 = 17;
