//! Creation request types.

use crate::config::Config;
use std::fmt;
use std::path::{Path, PathBuf};

/// What kind of filesystem object to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A regular file.
    File,
    /// A directory. Always made traversable by its owner.
    Directory,
}

impl ObjectKind {
    pub fn is_directory(self) -> bool {
        matches!(self, ObjectKind::Directory)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::File => write!(f, "file"),
            ObjectKind::Directory => write!(f, "directory"),
        }
    }
}

/// One restricted-creation call: what to create, where, and how.
///
/// Built per invocation and consumed by
/// [`RestrictedFileCreator::create`](super::RestrictedFileCreator::create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    path: PathBuf,
    kind: ObjectKind,
    writable_by_owner: bool,
    restrictions_disabled: bool,
}

impl CreationRequest {
    pub fn new<P: Into<PathBuf>>(path: P, kind: ObjectKind, writable_by_owner: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            writable_by_owner,
            restrictions_disabled: false,
        }
    }

    /// A regular file, writable by its owner only if `writable_by_owner`.
    pub fn file<P: Into<PathBuf>>(path: P, writable_by_owner: bool) -> Self {
        Self::new(path, ObjectKind::File, writable_by_owner)
    }

    /// A directory the owner can list, enter and write to.
    pub fn directory<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(path, ObjectKind::Directory, true)
    }

    /// Skip the lockdown procedure and create the object with default permissions.
    pub fn with_restrictions_disabled(mut self, disabled: bool) -> Self {
        self.restrictions_disabled = disabled;
        self
    }

    /// Apply the creation-related settings of `config`.
    pub fn with_config(self, config: &Config) -> Self {
        self.with_restrictions_disabled(config.disable_restricted_files)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn writable_by_owner(&self) -> bool {
        self.writable_by_owner
    }

    pub fn restrictions_disabled(&self) -> bool {
        self.restrictions_disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_requests_are_owner_writable() {
        let request = CreationRequest::directory("d");
        assert_eq!(request.kind(), ObjectKind::Directory);
        assert!(request.writable_by_owner());
        assert!(!request.restrictions_disabled());
    }

    #[test]
    fn config_controls_restrictions() {
        let config = Config {
            disable_restricted_files: true,
            ..Config::default()
        };
        let request = CreationRequest::file("f", false).with_config(&config);
        assert!(request.restrictions_disabled());

        let request = CreationRequest::file("f", false).with_config(&Config::default());
        assert!(!request.restrictions_disabled());
    }

    #[test]
    fn kind_display() {
        assert_eq!(ObjectKind::File.to_string(), "file");
        assert_eq!(ObjectKind::Directory.to_string(), "directory");
    }
}
