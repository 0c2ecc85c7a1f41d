//! Advisory file locking.
//!
//! Cooperating processes coordinate access to one existing file through
//! byte-range locks on it:
//!
//! - An exclusive lock covers the whole file (offset 0 to the end of the
//!   address space).
//! - A shared lock is requested on byte 0. Where the platform primitive has
//!   real shared locks, that is the lock. Where it only grants exclusive ones
//!   (or [`Config::emulate_shared_locks`](crate::config::Config) is set), each
//!   shared holder instead claims its own byte ("slot") from 1 upward, so
//!   shared holders never collide while every one of them still overlaps a
//!   whole-file exclusive lock. The scan stops at the configured probe limit.
//!
//! # RAII Handles
//!
//! A [`LockHandle`] releases its lock when dropped. If the release fails
//! during drop, a warning is logged but the program does not crash.
//!
//! Locks are advisory: a process that never asks for them is not stopped.

mod guard;
mod operations;
mod primitive;
#[cfg(unix)]
mod registry;
mod types;

#[cfg(test)]
mod tests;

pub use guard::LockHandle;
pub use operations::{AdvisoryLocker, acquire};
pub use primitive::{ExclusiveOnly, NativeLocker, RangeLocker};
pub use types::{LockMode, LockRange};
