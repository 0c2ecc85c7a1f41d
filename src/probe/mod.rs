//! Permission probe.
//!
//! Answers "can I use this path?" without creating anything restricted:
//!
//! - [`test_file`] classifies an existing path as an [`OpenFileResult`].
//! - [`test_directory`] validates the directory that holds a path.
//! - [`DirectoryValidator`] creates and checks any set of directories.
//!
//! Access is judged for the current user (`access(2)` on Unix), so a
//! privileged process sees most paths as usable.

mod directory;
mod file;

#[cfg(test)]
mod tests;

pub use directory::{DirectoryCheck, DirectoryCheckResults, DirectoryProblem, DirectoryValidator};
pub use file::{OpenFileResult, test_directory, test_file};
