//! In-process bookkeeping for per-process record locks.
//!
//! Classic `fcntl` record locks belong to the process: two descriptors of one
//! process never conflict, unlocking a range through one descriptor unlocks it
//! for all of them, and closing any descriptor of a file drops every lock the
//! process holds on it. [`ProcessLocks`] restores per-handle semantics on top
//! of that by recording which descriptor holds which range of which file.
//! Conflicting requests from other descriptors are refused (or made to wait)
//! before they reach the kernel, only ranges no other holder still covers are
//! unlocked, and descriptors are parked instead of closed while another
//! holder on the same file is live.

#![cfg_attr(target_os = "linux", allow(dead_code))]

use super::types::{LockMode, LockRange};
use std::collections::HashMap;

/// Identity of a file: device and inode.
pub(super) type FileKey = (u64, u64);

/// Identity of a lock holder: its open descriptor.
pub(super) type Owner = i32;

#[derive(Debug, Clone, Copy)]
struct Hold {
    owner: Owner,
    range: LockRange,
    mode: LockMode,
}

impl Hold {
    fn conflicts_with(&self, owner: Owner, range: &LockRange, mode: LockMode) -> bool {
        self.owner != owner
            && self.range.overlaps(range)
            && (self.mode == LockMode::Exclusive || mode == LockMode::Exclusive)
    }
}

#[derive(Debug)]
struct FileLocks<F> {
    holds: Vec<Hold>,
    parked: Vec<F>,
}

impl<F> Default for FileLocks<F> {
    fn default() -> Self {
        Self {
            holds: Vec::new(),
            parked: Vec::new(),
        }
    }
}

/// Holds and parked descriptors per file. `F` is the open file type.
#[derive(Debug)]
pub(super) struct ProcessLocks<F> {
    files: HashMap<FileKey, FileLocks<F>>,
}

impl<F> Default for ProcessLocks<F> {
    fn default() -> Self {
        Self {
            files: HashMap::new(),
        }
    }
}

impl<F> ProcessLocks<F> {
    /// Record `owner` as holding `range` in `mode`.
    ///
    /// Returns `false`, recording nothing, if another owner holds a
    /// conflicting range of the same file.
    pub(super) fn claim(
        &mut self,
        key: FileKey,
        owner: Owner,
        range: LockRange,
        mode: LockMode,
    ) -> bool {
        let entry = self.files.entry(key).or_default();
        if entry
            .holds
            .iter()
            .any(|hold| hold.conflicts_with(owner, &range, mode))
        {
            return false;
        }
        entry.holds.push(Hold { owner, range, mode });
        true
    }

    /// Forget `owner`'s hold on `range` and return the parts of it that no
    /// remaining hold covers. Only those may be unlocked in the kernel.
    pub(super) fn release(
        &mut self,
        key: FileKey,
        owner: Owner,
        range: LockRange,
    ) -> Vec<LockRange> {
        let Some(entry) = self.files.get_mut(&key) else {
            return vec![range];
        };
        if let Some(index) = entry
            .holds
            .iter()
            .position(|hold| hold.owner == owner && hold.range == range)
        {
            entry.holds.remove(index);
        }
        let cover: Vec<LockRange> = entry.holds.iter().map(|hold| hold.range).collect();
        uncovered(range, &cover)
    }

    /// Hand over `owner`'s file for closing.
    ///
    /// Any holds `owner` still has are forgotten. While other holders of the
    /// same file remain, the file is parked and nothing is returned; once none
    /// remain, every parked file is returned along with this one and may be
    /// closed.
    pub(super) fn retire(&mut self, key: FileKey, owner: Owner, file: F) -> Vec<F> {
        let Some(entry) = self.files.get_mut(&key) else {
            return vec![file];
        };
        entry.holds.retain(|hold| hold.owner != owner);
        if entry.holds.is_empty() {
            let mut closable = self
                .files
                .remove(&key)
                .map(|entry| entry.parked)
                .unwrap_or_default();
            closable.push(file);
            closable
        } else {
            entry.parked.push(file);
            Vec::new()
        }
    }
}

/// Parts of `range` outside every range in `cover`.
fn uncovered(range: LockRange, cover: &[LockRange]) -> Vec<LockRange> {
    let end = range.offset.saturating_add(range.len);
    let mut spans: Vec<(u64, u64)> = cover
        .iter()
        .filter(|c| c.overlaps(&range))
        .map(|c| (c.offset, c.offset.saturating_add(c.len)))
        .collect();
    spans.sort_unstable();

    let mut pieces = Vec::new();
    let mut cursor = range.offset;
    for (start, stop) in spans {
        if start > cursor {
            pieces.push(span(cursor, start));
        }
        cursor = cursor.max(stop);
        if cursor >= end {
            return pieces;
        }
    }
    if cursor < end {
        pieces.push(span(cursor, end));
    }
    pieces
}

/// `start..stop`, where a `stop` of `u64::MAX` is open-ended.
fn span(start: u64, stop: u64) -> LockRange {
    if stop == u64::MAX {
        LockRange::new(start, u64::MAX)
    } else {
        LockRange::new(start, stop - start)
    }
}
