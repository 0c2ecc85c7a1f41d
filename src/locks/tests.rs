//! Tests for the locks subsystem.

use super::*;
use crate::config::Config;
use crate::error::ErrorKind;
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory holding one empty file to lock.
fn lock_target() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("shared.lock");
    std::fs::write(&path, b"").unwrap();
    (temp, path)
}

// ============================================================================
// Probe algorithm (scripted primitive, any platform)
// ============================================================================

/// In-memory primitive: `occupied` holds byte offsets owned by someone else.
#[derive(Debug, Default)]
struct ScriptedLocker {
    upgrade_shared: bool,
    fail_at: Option<u64>,
    occupied: Mutex<HashSet<u64>>,
    unlocked: Mutex<Vec<LockRange>>,
    retired: Mutex<usize>,
}

impl ScriptedLocker {
    fn upgrading() -> Self {
        Self {
            upgrade_shared: true,
            ..Self::default()
        }
    }

    fn occupy(&self, offsets: impl IntoIterator<Item = u64>) {
        self.occupied.lock().unwrap().extend(offsets);
    }

    fn unlocked(&self) -> Vec<LockRange> {
        self.unlocked.lock().unwrap().clone()
    }

    fn retired(&self) -> usize {
        *self.retired.lock().unwrap()
    }
}

impl RangeLocker for ScriptedLocker {
    fn lock(&self, _file: &File, _range: LockRange, mode: LockMode) -> io::Result<LockMode> {
        if self.upgrade_shared {
            Ok(LockMode::Exclusive)
        } else {
            Ok(mode)
        }
    }

    fn try_lock(
        &self,
        _file: &File,
        range: LockRange,
        mode: LockMode,
    ) -> io::Result<Option<LockMode>> {
        if self.fail_at == Some(range.offset) {
            return Err(io::Error::other("lock table full"));
        }
        let mut occupied = self.occupied.lock().unwrap();
        if occupied.contains(&range.offset) {
            return Ok(None);
        }
        occupied.insert(range.offset);
        Ok(Some(mode))
    }

    fn unlock(&self, _file: &File, range: LockRange) -> io::Result<()> {
        self.occupied.lock().unwrap().remove(&range.offset);
        self.unlocked.lock().unwrap().push(range);
        Ok(())
    }

    fn retire(&self, file: File) {
        *self.retired.lock().unwrap() += 1;
        drop(file);
    }
}

fn scripted(locker: &Arc<ScriptedLocker>, limit: u64) -> AdvisoryLocker {
    let dyn_locker: Arc<dyn RangeLocker> = locker.clone();
    AdvisoryLocker::new(dyn_locker, limit)
}

#[test]
fn native_shared_lock_keeps_head_byte() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker::default());

    let handle = scripted(&fake, 8).acquire(&path, true, false).unwrap();

    assert!(handle.is_shared());
    assert_eq!(handle.range(), LockRange::byte(0));
    assert!(fake.unlocked().is_empty());
}

#[test]
fn upgraded_shared_lock_takes_first_free_slot() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker::upgrading());
    fake.occupy([1, 2]);

    let handle = scripted(&fake, 8).acquire(&path, true, true).unwrap();

    assert!(handle.is_shared());
    assert!(!handle.is_exclusive());
    assert_eq!(handle.range(), LockRange::byte(3));
    assert_eq!(fake.unlocked(), vec![LockRange::byte(0)]);
}

#[test]
fn exhausted_probe_releases_head_and_reports_limit() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker::upgrading());
    fake.occupy([1, 2, 3]);

    let err = scripted(&fake, 3).acquire(&path, true, true).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LockSlotsExhausted);
    assert!(err.to_string().contains("within 3 positions"));
    assert_eq!(fake.unlocked(), vec![LockRange::byte(0)]);
}

#[test]
fn probe_error_is_lock_io_error() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker {
        upgrade_shared: true,
        fail_at: Some(2),
        ..ScriptedLocker::default()
    });
    fake.occupy([1]);

    let err = scripted(&fake, 8).acquire(&path, true, true).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LockIoError);
    assert!(fake.unlocked().contains(&LockRange::byte(0)));
}

#[test]
fn non_blocking_exclusive_reports_unavailable() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker::default());
    fake.occupy([0]);

    let err = scripted(&fake, 8).acquire(&path, false, false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LockUnavailable);
}

#[test]
fn drop_unlocks_exactly_once() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker::upgrading());

    let handle = scripted(&fake, 8).acquire(&path, true, true).unwrap();
    handle.release().unwrap();

    assert_eq!(
        fake.unlocked(),
        vec![LockRange::byte(0), LockRange::byte(1)]
    );

    let handle = scripted(&fake, 8).acquire(&path, false, true).unwrap();
    drop(handle);

    assert_eq!(fake.unlocked().last(), Some(&LockRange::WHOLE_FILE));
    assert_eq!(fake.unlocked().len(), 3);
}

#[test]
fn every_opened_file_is_handed_back_to_the_primitive() {
    let (_temp, path) = lock_target();
    let fake = Arc::new(ScriptedLocker::upgrading());
    let locker = scripted(&fake, 2);

    let handle = locker.acquire(&path, false, false).unwrap();
    assert_eq!(fake.retired(), 0);

    // Refused and exhausted attempts close their file through the primitive too.
    fake.occupy([1, 2]);
    let err = locker.acquire(&path, false, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockUnavailable);
    let err = locker.acquire(&path, true, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockSlotsExhausted);
    assert_eq!(fake.retired(), 2);

    handle.release().unwrap();
    assert_eq!(fake.retired(), 3);
}

#[test]
fn exclusive_only_upgrades_every_request() {
    let (_temp, path) = lock_target();
    let file = File::open(&path).unwrap();
    let fake = ExclusiveOnly(ScriptedLocker::default());

    let granted = fake.lock(&file, LockRange::byte(0), LockMode::Shared).unwrap();
    assert_eq!(granted, LockMode::Exclusive);

    let granted = fake.try_lock(&file, LockRange::byte(5), LockMode::Shared).unwrap();
    assert_eq!(granted, Some(LockMode::Exclusive));
}

#[test]
fn acquire_missing_file_is_path_not_found() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.lock");

    for shared in [false, true] {
        let err = acquire(&missing, shared, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
    }
    assert!(!missing.exists());
}

#[test]
fn acquire_directory_is_not_a_plain_file() {
    let temp = TempDir::new().unwrap();

    for shared in [false, true] {
        let err = acquire(temp.path(), shared, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAPlainFile);
        assert_eq!(err.exit_code(), crate::exit_codes::PROBE_FAILURE);
        assert!(err.to_string().contains("is not a plain file"), "{err}");
    }
}

#[test]
fn from_config_uses_probe_limit() {
    let config = Config {
        shared_lock_probe_limit: 12,
        ..Config::default()
    };
    assert_eq!(AdvisoryLocker::from_config(&config).probe_limit(), 12);
    assert_eq!(
        AdvisoryLocker::default().probe_limit(),
        crate::config::DEFAULT_SHARED_LOCK_PROBE_LIMIT
    );
}

// ============================================================================
// Native primitive across handles
// ============================================================================

#[cfg(any(unix, windows))]
mod native {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    fn emulating(limit: u64) -> AdvisoryLocker {
        AdvisoryLocker::from_config(&Config {
            emulate_shared_locks: true,
            shared_lock_probe_limit: limit,
            ..Config::default()
        })
    }

    #[test]
    fn second_exclusive_without_blocking_is_unavailable() {
        let (_temp, path) = lock_target();

        let first = acquire(&path, false, false).unwrap();
        assert!(first.is_exclusive());
        assert_eq!(first.range(), LockRange::WHOLE_FILE);

        let err = acquire(&path, false, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockUnavailable);

        drop(first);
        acquire(&path, false, false).unwrap();
    }

    #[test]
    fn refused_attempt_leaves_holder_locked() {
        let (_temp, path) = lock_target();
        let holder = acquire(&path, false, false).unwrap();

        for _ in 0..2 {
            let err = acquire(&path, false, false).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::LockUnavailable);
            let err = acquire(&path, false, false).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::LockUnavailable);
        }

        assert!(holder.is_exclusive());
        drop(holder);
        acquire(&path, false, false).unwrap();
    }

    #[test]
    fn dropping_one_shared_holder_keeps_the_others() {
        let (_temp, path) = lock_target();
        let first = acquire(&path, true, false).unwrap();
        let second = acquire(&path, true, false).unwrap();

        drop(first);
        let err = acquire(&path, false, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockUnavailable);

        drop(second);
        acquire(&path, false, false).unwrap();
    }

    #[test]
    fn blocking_exclusive_waits_for_release() {
        let (_temp, path) = lock_target();
        let first = acquire(&path, false, false).unwrap();
        let released = Arc::new(AtomicBool::new(false));

        let waiter = {
            let path = path.clone();
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let handle = acquire(&path, false, true).unwrap();
                assert!(released.load(Ordering::SeqCst));
                handle.is_exclusive()
            })
        };

        thread::sleep(Duration::from_millis(100));
        released.store(true, Ordering::SeqCst);
        first.release().unwrap();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn shared_holders_coexist_and_block_exclusive() {
        let (_temp, path) = lock_target();
        let holders: Vec<_> = (0..3).map(|_| acquire(&path, true, false).unwrap()).collect();
        assert!(holders.iter().all(LockHandle::is_shared));

        let err = acquire(&path, false, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockUnavailable);

        let released = Arc::new(AtomicBool::new(false));
        let writer = {
            let path = path.clone();
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let _handle = acquire(&path, false, true).unwrap();
                assert!(released.load(Ordering::SeqCst));
            })
        };

        thread::sleep(Duration::from_millis(100));
        released.store(true, Ordering::SeqCst);
        drop(holders);

        writer.join().unwrap();
    }

    #[test]
    fn shared_request_waits_for_exclusive_holder() {
        let (_temp, path) = lock_target();
        let writer = acquire(&path, false, false).unwrap();
        let released = Arc::new(AtomicBool::new(false));

        // allow_block is ignored for shared requests.
        let reader = {
            let path = path.clone();
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let handle = acquire(&path, true, false).unwrap();
                assert!(released.load(Ordering::SeqCst));
                handle.is_shared()
            })
        };

        thread::sleep(Duration::from_millis(100));
        released.store(true, Ordering::SeqCst);
        drop(writer);

        assert!(reader.join().unwrap());
    }

    #[test]
    fn emulated_shared_holders_take_distinct_slots() {
        let (_temp, path) = lock_target();
        let locker = emulating(16);

        let holders: Vec<_> = (0..3)
            .map(|_| locker.acquire(&path, true, false).unwrap())
            .collect();

        let ranges: Vec<_> = holders.iter().map(LockHandle::range).collect();
        assert_eq!(
            ranges,
            vec![LockRange::byte(1), LockRange::byte(2), LockRange::byte(3)]
        );
        assert!(holders.iter().all(LockHandle::is_shared));

        let err = locker.acquire(&path, false, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockUnavailable);
    }

    #[test]
    fn emulated_slot_is_reused_after_release() {
        let (_temp, path) = lock_target();
        let locker = emulating(16);

        let first = locker.acquire(&path, true, true).unwrap();
        let second = locker.acquire(&path, true, true).unwrap();
        assert_eq!(second.range(), LockRange::byte(2));

        drop(first);
        let third = locker.acquire(&path, true, true).unwrap();
        assert_eq!(third.range(), LockRange::byte(1));
    }

    #[test]
    fn emulated_probe_stops_at_limit() {
        let (_temp, path) = lock_target();
        let locker = emulating(2);

        let a = locker.acquire(&path, true, true).unwrap();
        let b = locker.acquire(&path, true, true).unwrap();

        let err = locker.acquire(&path, true, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockSlotsExhausted);

        // The head byte was let go, so a writer is only blocked by the slots.
        drop((a, b));
        locker.acquire(&path, false, false).unwrap();
    }

    #[test]
    fn handle_display_names_mode_and_range() {
        let (_temp, path) = lock_target();
        let handle = acquire(&path, false, false).unwrap();

        let shown = handle.to_string();
        assert!(shown.contains("exclusive lock"), "{shown}");
        assert!(shown.contains("whole file"), "{shown}");
        assert!(handle.held_for() >= chrono::Duration::zero());
        assert_eq!(handle.path(), path.as_path());
    }
}
