//! Directory usability checks.

use crate::fs::access::{can_execute, can_read, can_write};
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One thing wrong with a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryProblem {
    /// Missing and could not be created.
    CouldNotCreate,
    /// Exists but is not a directory.
    NotADirectory,
    NotReadable,
    NotWritable,
    NotTraversable,
    /// Access checks passed but a file could not actually be created and removed.
    ScratchFileFailed,
}

impl DirectoryProblem {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryProblem::CouldNotCreate => "could not be created",
            DirectoryProblem::NotADirectory => "is not a directory",
            DirectoryProblem::NotReadable => "is not readable",
            DirectoryProblem::NotWritable => "is not writable",
            DirectoryProblem::NotTraversable => "is not traversable",
            DirectoryProblem::ScratchFileFailed => "does not accept new files",
        }
    }
}

impl fmt::Display for DirectoryProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryCheck {
    pub path: PathBuf,
    /// Problems found (empty if the directory is usable).
    pub problems: Vec<DirectoryProblem>,
}

impl DirectoryCheck {
    pub fn passed(&self) -> bool {
        self.problems.is_empty()
    }

    /// One message per problem, naming the directory.
    pub fn messages(&self) -> Vec<String> {
        self.problems
            .iter()
            .map(|p| format!("'{}' {}", self.path.display(), p))
            .collect()
    }
}

/// Outcome of checking a set of directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryCheckResults {
    pub checks: Vec<DirectoryCheck>,
}

impl DirectoryCheckResults {
    /// Number of directories with at least one problem. Zero means all usable.
    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }

    pub fn passed(&self) -> bool {
        self.failures() == 0
    }

    /// Human-readable description of every problem found.
    pub fn details(&self) -> Vec<String> {
        self.checks.iter().flat_map(DirectoryCheck::messages).collect()
    }
}

impl fmt::Display for DirectoryCheckResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "{} directories usable", self.checks.len());
        }
        write!(f, "{} of {} directories unusable", self.failures(), self.checks.len())?;
        for detail in self.details() {
            write!(f, "\n  - {}", detail)?;
        }
        Ok(())
    }
}

/// Makes sure a set of directories exists and is usable by the current user.
#[derive(Debug, Clone)]
pub struct DirectoryValidator {
    dirs: Vec<PathBuf>,
}

impl DirectoryValidator {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Create each missing directory (with its ancestors), then check it.
    ///
    /// Never fails as a whole; every problem is reported in the results.
    pub fn ensure_dirs(&self) -> DirectoryCheckResults {
        DirectoryCheckResults {
            checks: self.dirs.iter().map(|dir| ensure_dir(dir)).collect(),
        }
    }
}

fn ensure_dir(dir: &Path) -> DirectoryCheck {
    let mut problems = Vec::new();

    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(dir) {
            debug!(path = %dir.display(), error = %e, "could not create directory");
            problems.push(DirectoryProblem::CouldNotCreate);
        } else {
            debug!(path = %dir.display(), "created directory");
        }
    }

    if problems.is_empty() {
        check_dir(dir, &mut problems);
    }

    DirectoryCheck {
        path: dir.to_path_buf(),
        problems,
    }
}

fn check_dir(dir: &Path, problems: &mut Vec<DirectoryProblem>) {
    if !dir.is_dir() {
        problems.push(DirectoryProblem::NotADirectory);
        return;
    }

    if !can_read(dir) {
        problems.push(DirectoryProblem::NotReadable);
    }
    if !can_write(dir) {
        problems.push(DirectoryProblem::NotWritable);
    }
    if !can_execute(dir) {
        problems.push(DirectoryProblem::NotTraversable);
    }

    if problems.is_empty() && !scratch_file_round_trip(dir) {
        problems.push(DirectoryProblem::ScratchFileFailed);
    }
}

/// Create and remove a uniquely named file inside `dir`.
fn scratch_file_round_trip(dir: &Path) -> bool {
    let name = format!(
        ".lockdown-probe-{}-{}",
        std::process::id(),
        SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let scratch = dir.join(name);

    let created = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&scratch)
        .map(drop);
    if let Err(e) = created {
        debug!(path = %scratch.display(), error = %e, "could not create scratch file");
        return false;
    }

    match fs::remove_file(&scratch) {
        Ok(()) => true,
        Err(e) => {
            debug!(path = %scratch.display(), error = %e, "could not remove scratch file");
            false
        }
    }
}
