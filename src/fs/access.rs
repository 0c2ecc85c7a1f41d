//! Access checks for the current user.
//!
//! On Unix these ask the kernel with `access(2)`, which evaluates the real uid
//! against mode bits and ACLs. Note that root passes read/write checks
//! regardless of mode bits. On Windows, readability is existence and
//! writability is the absence of the read-only attribute.

use std::path::Path;

/// Whether the current user may read `path`.
pub fn can_read(path: &Path) -> bool {
    imp::check(path, imp::Access::Read)
}

/// Whether the current user may write `path`.
pub fn can_write(path: &Path) -> bool {
    imp::check(path, imp::Access::Write)
}

/// Whether the current user may execute `path` (traverse it, for a directory).
pub fn can_execute(path: &Path) -> bool {
    imp::check(path, imp::Access::Execute)
}

#[cfg(unix)]
mod imp {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    pub(super) enum Access {
        Read,
        Write,
        Execute,
    }

    pub(super) fn check(path: &Path, access: Access) -> bool {
        let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
            return false;
        };
        let mode = match access {
            Access::Read => libc::R_OK,
            Access::Write => libc::W_OK,
            Access::Execute => libc::X_OK,
        };
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
    }
}

#[cfg(not(unix))]
mod imp {
    use std::path::Path;

    pub(super) enum Access {
        Read,
        Write,
        Execute,
    }

    pub(super) fn check(path: &Path, access: Access) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        match access {
            Access::Read | Access::Execute => true,
            Access::Write => !meta.permissions().readonly(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_path_is_inaccessible() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        assert!(!can_read(&missing));
        assert!(!can_write(&missing));
        assert!(!can_execute(&missing));
    }

    #[test]
    fn fresh_file_is_readable_and_writable() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("f");
        std::fs::write(&file, b"x").unwrap();

        assert!(can_read(&file));
        assert!(can_write(&file));
    }

    #[test]
    fn directory_is_traversable() {
        let temp = TempDir::new().unwrap();
        assert!(can_execute(temp.path()));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_file_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        if crate::test_support::running_as_root() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("ro");
        std::fs::write(&file, b"x").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o400)).unwrap();

        assert!(can_read(&file));
        assert!(!can_write(&file));
    }
}
