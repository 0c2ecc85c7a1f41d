//! Tests for config functionality.

use crate::config::{Config, DEFAULT_DISPLAY_PATH_WIDTH, DEFAULT_SHARED_LOCK_PROBE_LIMIT};
use crate::error::ErrorKind;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(!config.disable_restricted_files);
    assert!(!config.emulate_shared_locks);
    assert_eq!(config.shared_lock_probe_limit, DEFAULT_SHARED_LOCK_PROBE_LIMIT);
    assert_eq!(config.display_path_width, DEFAULT_DISPLAY_PATH_WIDTH);
}

#[test]
fn test_parse_empty_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
disable_restricted_files: true
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert!(config.disable_restricted_files);
    // Unspecified values should use defaults
    assert_eq!(config.shared_lock_probe_limit, DEFAULT_SHARED_LOCK_PROBE_LIMIT);
    assert_eq!(config.display_path_width, DEFAULT_DISPLAY_PATH_WIDTH);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
disable_restricted_files: false
emulate_shared_locks: true
shared_lock_probe_limit: 128
display_path_width: 60
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert!(!config.disable_restricted_files);
    assert!(config.emulate_shared_locks);
    assert_eq!(config.shared_lock_probe_limit, 128);
    assert_eq!(config.display_path_width, 60);
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
emulate_shared_locks: true
some_future_setting: 42
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert!(config.emulate_shared_locks);
}

#[test]
fn test_zero_probe_limit_rejected() {
    let err = Config::from_yaml("shared_lock_probe_limit: 0").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UserError);
    assert!(err.to_string().contains("shared_lock_probe_limit"));
}

#[test]
fn test_invalid_yaml_rejected() {
    let err = Config::from_yaml("disable_restricted_files: [not, a, bool]").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_yaml_round_trip() {
    let config = Config {
        disable_restricted_files: true,
        emulate_shared_locks: true,
        shared_lock_probe_limit: 7,
        display_path_width: 12,
    };

    let yaml = config.to_yaml().unwrap();
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lockdown.yaml");
    std::fs::write(&path, "display_path_width: 20\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.display_path_width, 20);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = Config::load(temp_dir.path().join("missing.yaml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("missing.yaml"));
}

#[test]
fn test_save_then_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("etc/lockdown/lockdown.yaml");
    let config = Config {
        emulate_shared_locks: true,
        shared_lock_probe_limit: 4,
        ..Config::default()
    };

    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_save_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lockdown.yaml");
    let config = Config {
        shared_lock_probe_limit: 0,
        ..Config::default()
    };

    assert!(config.save(&path).is_err());
    assert!(!path.exists());
}
