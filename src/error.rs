//! Error types for lockdown.
//!
//! Uses thiserror for derive macros. Every variant names the path involved so a
//! caller can tell the user exactly which step failed ("could not set
//! permissions" vs. "could not create file").

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for lockdown operations.
#[derive(Error, Debug)]
pub enum LockdownError {
    /// The target of a restricted creation already exists.
    #[error("'{}' already exists", path.display())]
    AlreadyExists { path: PathBuf },

    /// The staging (or, when restrictions are disabled, final) object could not be created.
    #[error("could not create '{}': {source}", path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Owner-only permissions could not be applied to the staging object.
    #[error("could not set permissions on '{}': {source}", path.display())]
    PermissionLockdownFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The locked-down staging object could not be moved to its final name.
    #[error("could not rename '{}' to '{}': {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A path could not be resolved to its canonical form.
    #[error("could not resolve '{}': {source}", path.display())]
    CanonicalizationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A non-blocking exclusive lock request was denied.
    #[error("lock on '{}' is held by another handle", path.display())]
    LockUnavailable { path: PathBuf },

    /// The shared-lock probe scanned its whole window without finding a free slot.
    #[error("no free shared-lock slot on '{}' within {limit} positions", path.display())]
    LockSlotsExhausted { path: PathBuf, limit: u64 },

    /// The platform lock primitive failed.
    #[error("lock operation on '{}' failed: {source}", path.display())]
    LockIoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path does not exist.
    #[error("'{}' does not exist", path.display())]
    PathNotFound { path: PathBuf },

    /// The path exists but is not a plain file.
    #[error("'{}' is not a plain file", path.display())]
    NotAPlainFile { path: PathBuf },

    /// A recursive delete reached outside its base directory.
    #[error("refusing to delete '{}': outside base directory '{}'", path.display(), base.display())]
    OutsideBase { path: PathBuf, base: PathBuf },

    /// A filesystem entry could not be deleted.
    #[error("unable to delete '{}': {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Generic I/O failure in a helper, with the path it concerned.
    #[error("{action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),
}

/// Plain classification of a [`LockdownError`], for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    CreateFailed,
    PermissionLockdownFailed,
    RenameFailed,
    CanonicalizationFailed,
    LockUnavailable,
    LockSlotsExhausted,
    LockIoError,
    PathNotFound,
    NotAPlainFile,
    OutsideBase,
    DeleteFailed,
    Io,
    UserError,
}

impl LockdownError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LockdownError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            LockdownError::CreateFailed { .. } => ErrorKind::CreateFailed,
            LockdownError::PermissionLockdownFailed { .. } => ErrorKind::PermissionLockdownFailed,
            LockdownError::RenameFailed { .. } => ErrorKind::RenameFailed,
            LockdownError::CanonicalizationFailed { .. } => ErrorKind::CanonicalizationFailed,
            LockdownError::LockUnavailable { .. } => ErrorKind::LockUnavailable,
            LockdownError::LockSlotsExhausted { .. } => ErrorKind::LockSlotsExhausted,
            LockdownError::LockIoError { .. } => ErrorKind::LockIoError,
            LockdownError::PathNotFound { .. } => ErrorKind::PathNotFound,
            LockdownError::NotAPlainFile { .. } => ErrorKind::NotAPlainFile,
            LockdownError::OutsideBase { .. } => ErrorKind::OutsideBase,
            LockdownError::DeleteFailed { .. } => ErrorKind::DeleteFailed,
            LockdownError::Io { .. } => ErrorKind::Io,
            LockdownError::UserError(_) => ErrorKind::UserError,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::AlreadyExists
            | ErrorKind::CreateFailed
            | ErrorKind::PermissionLockdownFailed
            | ErrorKind::RenameFailed => exit_codes::CREATE_FAILURE,
            ErrorKind::CanonicalizationFailed
            | ErrorKind::PathNotFound
            | ErrorKind::NotAPlainFile => exit_codes::PROBE_FAILURE,
            ErrorKind::LockUnavailable
            | ErrorKind::LockSlotsExhausted
            | ErrorKind::LockIoError => exit_codes::LOCK_FAILURE,
            ErrorKind::OutsideBase
            | ErrorKind::DeleteFailed
            | ErrorKind::Io
            | ErrorKind::UserError => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for lockdown operations.
pub type Result<T> = std::result::Result<T, LockdownError>;
