//! Integration tests for `logtrack config` command.
//!
//! Tests config loading and validation behaviour with real TOML files.

use std::fs;

use logtrack_core::config::LogtrackConfig;
use tempfile::TempDir;

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("logtrack.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[store]
dsn = "postgresql://mwa@localhost:5432/asvo"
batch_size = 500

[processor]
log_path = "/var/log/asvo"
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    // When: Loading the config
    let result = LogtrackConfig::load(&config_path).await;

    // Then: Should succeed
    let config = result.expect("valid config should load successfully");
    assert_eq!(config.store.batch_size, 500);
    assert_eq!(config.processor.log_path, "/var/log/asvo");
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    // Given: A malformed TOML file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    fs::write(&config_path, "[store\nbatch_size = 1\n").expect("should write bad config");

    // When / Then: Loading should fail
    let result = LogtrackConfig::load(&config_path).await;
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_missing_explicit_file_fails() {
    let result = LogtrackConfig::from_file("/nonexistent/logtrack.toml").await;
    assert!(result.is_err(), "missing file should fail to load");
}

#[tokio::test]
async fn test_config_missing_implicit_file_uses_defaults() {
    let config = LogtrackConfig::load_or_default("/nonexistent/logtrack.toml")
        .await
        .expect("missing default config is tolerated");
    config.validate().expect("defaults are valid");
    assert!(!config.processor.dry_run);
}

#[tokio::test]
async fn test_config_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").expect("should write empty file");

    let config = LogtrackConfig::load(&config_path)
        .await
        .expect("empty config should use defaults");
    assert_eq!(config.store.batch_size, 1000);
    assert_eq!(config.handlers.download_threshold_secs, 86_400);
}

#[tokio::test]
async fn test_config_empty_dsn_requires_dry_run() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("dsn.toml");
    fs::write(&config_path, "[store]\ndsn = \"\"\n").expect("should write config");

    let mut config = LogtrackConfig::from_file(&config_path)
        .await
        .expect("should parse");
    assert!(config.validate().is_err(), "empty dsn without dry-run");

    // `run --dry-run` 이 적용된 뒤에는 통과
    config.processor.dry_run = true;
    config.validate().expect("empty dsn is fine in dry-run");
}

#[tokio::test]
async fn test_config_boundary_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("boundary.toml");

    let boundary_config = r#"
[general]
log_level = "trace"

[store]
batch_size = 100000

[handlers]
download_threshold_secs = 1
"#;

    fs::write(&config_path, boundary_config).expect("should write config");

    let config = LogtrackConfig::load(&config_path)
        .await
        .expect("boundary values should be accepted");
    assert_eq!(config.store.batch_size, 100_000);
    assert_eq!(config.handlers.download_threshold_secs, 1);

    fs::write(&config_path, "[store]\nbatch_size = 100001\n").expect("should write config");
    assert!(LogtrackConfig::load(&config_path).await.is_err());
}

#[tokio::test]
async fn test_config_unicode_paths() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("unicode.toml");

    let unicode_config = r#"
[processor]
log_path = "/데이터/로그"
rules_path = "/설정/규칙.yml"
"#;

    fs::write(&config_path, unicode_config).expect("should write unicode config");

    let config = LogtrackConfig::load(&config_path)
        .await
        .expect("unicode config should load");
    assert!(config.processor.log_path.contains("로그"));
    assert!(
        config
            .processor
            .rules_file()
            .is_some_and(|p| p.ends_with("규칙.yml"))
    );
}
