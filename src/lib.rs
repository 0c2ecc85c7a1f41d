//! Lockdown: owner-restricted file creation and portable advisory file locking.
//!
//! - [`restrict`] creates files and directories that only their owner can
//!   access, with no instant at which a more permissive object is visible
//!   under the final name.
//! - [`locks`] acquires shared or exclusive advisory locks on an existing
//!   file, with the same semantics on platforms with and without native
//!   shared locks.
//! - [`probe`] checks whether an existing path (and its directory) is usable.
//!
//! The library emits `tracing` events but never installs a subscriber.

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod probe;
pub mod restrict;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{ErrorKind, LockdownError, Result};
pub use locks::{AdvisoryLocker, LockHandle};
pub use probe::{OpenFileResult, test_directory, test_file};
pub use restrict::{
    CreationRequest, RestrictedFileCreator, create_restricted_directory, create_restricted_file,
};
