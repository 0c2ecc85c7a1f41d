//! POSIX mode-bit lockdown.

use super::request::ObjectKind;
use super::strategy::PermissionLockdownStrategy;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Owner-only permissions expressed as mode bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixStrategy;

/// The mode applied to a restricted object: group and other get nothing, the
/// owner always reads, writes only if `writable_by_owner`, and executes only
/// directories.
pub fn restricted_mode(kind: ObjectKind, writable_by_owner: bool) -> u32 {
    let mut mode = 0o400;
    if writable_by_owner {
        mode |= 0o200;
    }
    if kind.is_directory() {
        mode |= 0o100;
    }
    mode
}

impl PermissionLockdownStrategy for PosixStrategy {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn lock_down(&self, path: &Path, kind: ObjectKind, writable_by_owner: bool) -> io::Result<()> {
        // One chmod replaces the whole mode, including setuid/setgid/sticky bits.
        let mode = restricted_mode(kind, writable_by_owner);
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }
}
