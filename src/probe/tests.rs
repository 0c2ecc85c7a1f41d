//! Tests for the permission probe.

use super::*;
use crate::error::ErrorKind;
use crate::test_support::running_as_root;
use tempfile::TempDir;

// ============================================================================
// test_file
// ============================================================================

#[test]
fn missing_file_is_failure() {
    let temp = TempDir::new().unwrap();
    assert_eq!(test_file(temp.path().join("absent")), OpenFileResult::Failure);
}

#[test]
fn missing_parent_is_failure() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("no-such-dir/file");

    assert_eq!(test_file(&path), OpenFileResult::Failure);
    assert!(!temp.path().join("no-such-dir").exists());
}

#[test]
fn directory_is_not_a_file() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("sub");
    std::fs::create_dir(&dir).unwrap();

    assert_eq!(test_file(&dir), OpenFileResult::NotAFile);
}

#[test]
fn read_write_file_is_success() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("settings.properties");
    std::fs::write(&file, b"key=value").unwrap();

    assert_eq!(test_file(&file), OpenFileResult::Success);
    assert_eq!(std::fs::read(&file).unwrap(), b"key=value");
}

#[test]
fn restricted_file_is_success() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("owner-only");
    crate::restrict::create_restricted_file(&file, true, &crate::config::Config::default())
        .unwrap();

    assert!(test_file(&file).is_success());
}

#[cfg(unix)]
#[test]
fn read_only_file_cant_write() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        return;
    }

    let temp = TempDir::new().unwrap();
    let file = temp.path().join("ro");
    std::fs::write(&file, b"").unwrap();
    std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o400)).unwrap();

    assert_eq!(test_file(&file), OpenFileResult::CantWrite);
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_failure() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        return;
    }

    let temp = TempDir::new().unwrap();
    let file = temp.path().join("wo");
    std::fs::write(&file, b"").unwrap();
    std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o200)).unwrap();

    assert_eq!(test_file(&file), OpenFileResult::Failure);
}

#[test]
fn open_file_result_serializes_snake_case() {
    let json = serde_json::to_string(&OpenFileResult::CantWrite).unwrap();
    assert_eq!(json, "\"cant_write\"");
    assert_eq!(OpenFileResult::NotAFile.to_string(), "not_a_file");
}

// ============================================================================
// test_directory
// ============================================================================

#[test]
fn test_directory_checks_parent() {
    let temp = TempDir::new().unwrap();
    let results = test_directory(temp.path().join("not-yet-created")).unwrap();

    assert_eq!(results.failures(), 0);
    assert_eq!(results.checks.len(), 1);
    assert_eq!(
        results.checks[0].path,
        temp.path().canonicalize().unwrap()
    );
}

#[test]
fn test_directory_missing_parent_fails() {
    let temp = TempDir::new().unwrap();
    let err = test_directory(temp.path().join("a/b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CanonicalizationFailed);
}

#[cfg(unix)]
#[test]
fn test_directory_reports_unwritable_parent() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        return;
    }

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

    let results = test_directory(locked.join("file")).unwrap();

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();
    assert_eq!(results.failures(), 1);
    assert_eq!(results.checks[0].problems, vec![DirectoryProblem::NotWritable]);
}

// ============================================================================
// DirectoryValidator
// ============================================================================

#[test]
fn ensure_dirs_creates_missing_directories() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("cache/deep");
    let logs = temp.path().join("logs");

    let results = DirectoryValidator::new([&cache, &logs]).ensure_dirs();

    assert!(results.passed(), "{results}");
    assert!(cache.is_dir());
    assert!(logs.is_dir());
    assert!(results.details().is_empty());
}

#[test]
fn ensure_dirs_leaves_no_scratch_files() {
    let temp = TempDir::new().unwrap();

    DirectoryValidator::new([temp.path()]).ensure_dirs();

    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn ensure_dirs_reports_file_in_the_way() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let results = DirectoryValidator::new([blocker.clone(), blocker.join("child")]).ensure_dirs();

    assert_eq!(results.failures(), 2);
    assert_eq!(
        results.checks[0].problems,
        vec![DirectoryProblem::NotADirectory]
    );
    assert_eq!(
        results.checks[1].problems,
        vec![DirectoryProblem::CouldNotCreate]
    );

    let details = results.details();
    assert_eq!(details.len(), 2);
    assert!(details[0].contains("is not a directory"));
    assert!(results.to_string().starts_with("2 of 2 directories unusable"));
}

#[test]
fn directory_results_serialize() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let results = DirectoryValidator::new([&blocker]).ensure_dirs();
    let json = serde_json::to_value(&results).unwrap();

    assert_eq!(json["checks"][0]["problems"][0], "not_a_directory");
}
