//! Filesystem utilities for lockdown.
//!
//! Small building blocks shared by restricted creation, the permission probe
//! and the CLI: a rename that never replaces, access checks for the current
//! user, path canonicalization/sanitizing/shortening, content digests, and
//! deletion confined to a base directory.

pub mod access;
pub mod atomic;
mod delete;
mod digest;
pub mod paths;
mod rename;

pub use atomic::{load_file_as_string, save_file};
pub use delete::{create_parent_dir, delete_with_warning, recursive_delete};
pub use digest::{DigestAlgorithm, file_digest};
pub use paths::{
    SANITIZED_CHAR, canonicalize_lenient, displayable_path, sanitize_file_name, sanitize_path,
};
pub use rename::{is_cross_device_rename, rename_no_replace};
