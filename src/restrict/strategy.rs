//! Platform permission lockdown strategies.

use super::request::ObjectKind;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Restricts an object's permissions to its owner.
///
/// Implementations receive a freshly created staging object that nobody else
/// has been told about yet. After `lock_down` returns `Ok`, no principal other
/// than the owner (and, on ACL systems, the system/administrator accounts) may
/// access it; the owner may read it, may write it only if
/// `writable_by_owner`, and may traverse it if it is a directory.
pub trait PermissionLockdownStrategy: fmt::Debug + Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Apply owner-only permissions to `path`.
    fn lock_down(&self, path: &Path, kind: ObjectKind, writable_by_owner: bool) -> io::Result<()>;
}

/// Strategy for platforms with neither POSIX mode bits nor Windows ACLs.
///
/// Always fails, so restricted creation fails instead of silently producing
/// an unrestricted object.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedStrategy;

impl PermissionLockdownStrategy for UnsupportedStrategy {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn lock_down(&self, _path: &Path, _kind: ObjectKind, _writable: bool) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no permission API available on this platform",
        ))
    }
}

static PLATFORM_STRATEGY: LazyLock<Arc<dyn PermissionLockdownStrategy>> =
    LazyLock::new(select_platform_strategy);

/// The strategy for the running platform, selected once per process.
pub fn platform_strategy() -> Arc<dyn PermissionLockdownStrategy> {
    Arc::clone(&PLATFORM_STRATEGY)
}

#[cfg(unix)]
fn select_platform_strategy() -> Arc<dyn PermissionLockdownStrategy> {
    Arc::new(super::posix::PosixStrategy)
}

#[cfg(windows)]
fn select_platform_strategy() -> Arc<dyn PermissionLockdownStrategy> {
    Arc::new(super::acl::AclStrategy)
}

#[cfg(not(any(unix, windows)))]
fn select_platform_strategy() -> Arc<dyn PermissionLockdownStrategy> {
    Arc::new(UnsupportedStrategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_strategy_always_fails() {
        let err = UnsupportedStrategy
            .lock_down(Path::new("anything"), ObjectKind::File, true)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[cfg(unix)]
    #[test]
    fn unix_selects_posix() {
        assert_eq!(platform_strategy().name(), "posix");
    }

    #[test]
    fn platform_strategy_is_shared() {
        let a = platform_strategy();
        let b = platform_strategy();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
