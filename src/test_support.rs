//! Helpers shared by unit tests.

/// Permission bits (without file type) of `path`.
#[cfg(unix)]
pub(crate) fn mode_of(path: &std::path::Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    std::fs::symlink_metadata(path)
        .unwrap_or_else(|e| panic!("failed to stat {}: {}", path.display(), e))
        .permissions()
        .mode()
        & 0o7777
}

/// Root passes every read/write access check regardless of mode bits, so
/// tests asserting "not writable" through `access(2)` skip themselves.
#[cfg(unix)]
pub(crate) fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub(crate) fn running_as_root() -> bool {
    false
}

/// Run `f` with the process umask set to `mask`, restoring it afterwards.
///
/// The umask is process-wide: callers must be `#[serial]`.
#[cfg(unix)]
pub(crate) fn with_umask<T>(mask: u32, f: impl FnOnce() -> T) -> T {
    struct Restore(libc::mode_t);

    impl Drop for Restore {
        fn drop(&mut self) {
            // SAFETY: umask has no preconditions.
            unsafe {
                libc::umask(self.0);
            }
        }
    }

    // SAFETY: umask has no preconditions.
    let _restore = Restore(unsafe { libc::umask(mask as libc::mode_t) });
    f()
}
