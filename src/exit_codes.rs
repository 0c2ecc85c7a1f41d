//! Exit code constants for the lockdown CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Creation failure (restricted file/directory could not be created)
//! - 3: Probe failure (path or directory not usable)
//! - 4: Lock failure (lock unavailable or lock I/O error)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or a refused delete.
pub const USER_ERROR: i32 = 1;

/// Restricted creation failed at one of its steps.
pub const CREATE_FAILURE: i32 = 2;

/// A probed path or directory is not usable.
pub const PROBE_FAILURE: i32 = 3;

/// Lock acquisition failure: lock unavailable, slots exhausted, or lock I/O error.
pub const LOCK_FAILURE: i32 = 4;
