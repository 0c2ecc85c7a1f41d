//! Restricted creation of files and directories.
//!
//! Creates a new file or directory that only its owner can read (and, when
//! requested, write), without ever exposing a less restricted version of it
//! under its final name.
//!
//! # Algorithm
//!
//! 1. Derive a staging path in the same directory as the target
//!    (`{target}.temp`), so the final rename stays on one filesystem/volume.
//! 2. Create the staging object with the platform's default permissions.
//! 3. Lock down the staging object's permissions through a
//!    [`PermissionLockdownStrategy`]: POSIX mode bits or a rewritten Windows ACL.
//! 4. Rename the staging object to the target without replacing anything.
//!
//! Anyone who can see the object under its final name therefore sees it fully
//! locked down. A failure at any step is reported with the step's own error
//! kind, and the staging object is removed best-effort; the final path is
//! never left behind.
//!
//! Setting [`Config::disable_restricted_files`](crate::config::Config) skips
//! steps 1, 3 and 4 and creates the object directly at the final path.

mod creator;
mod request;
mod strategy;

#[cfg(unix)]
mod posix;

#[cfg(windows)]
mod acl;


// Re-export public API
pub use creator::{
    RestrictedFileCreator, STAGING_SUFFIX, create_restricted_directory, create_restricted_file,
    staging_path,
};
pub use request::{CreationRequest, ObjectKind};
pub use strategy::{PermissionLockdownStrategy, UnsupportedStrategy, platform_strategy};

#[cfg(unix)]
pub use posix::{PosixStrategy, restricted_mode};

#[cfg(windows)]
pub use acl::AclStrategy;
