//! Tests for layered configuration loading.
//!
//! These avoid mutating the process environment: everything is driven
//! through `.env` files in a temporary directory.

use questboard::config::{ConfigError, ConfigLoader};
use std::fs;
use tempfile::TempDir;

fn write_env(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn test_load_from_base_env_file() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_ADMIN_TOKEN=file-token\n\
         QUESTBOARD_API_BIND_ADDR=127.0.0.1:9321\n\
         QUESTBOARD_SYNC_API_KEY=file-sync-key\n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(config.admin_tokens, vec!["file-token".to_string()]);
    assert_eq!(config.api_bind_addr, "127.0.0.1:9321");
    assert_eq!(config.sync_api_key.as_deref(), Some("file-sync-key"));
    assert_eq!(config.profile, "local");
}

#[test]
fn test_profile_env_file_overrides_base() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_PROFILE=staging\n\
         QUESTBOARD_ADMIN_TOKEN=base-token\n\
         QUESTBOARD_LOG_LEVEL=info\n",
    );
    write_env(&dir, ".env.staging", "QUESTBOARD_LOG_LEVEL=debug\n");

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(config.profile, "staging");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.admin_tokens, vec!["base-token".to_string()]);
}

#[test]
fn test_comma_separated_admin_tokens() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_ADMIN_TOKENS=one, two ,three,\n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(
        config.admin_tokens,
        vec!["one".to_string(), "two".to_string(), "three".to_string()]
    );
}

#[test]
fn test_missing_admin_tokens_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_env(&dir, ".env", "QUESTBOARD_LOG_LEVEL=debug\n");

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();

    assert!(matches!(result, Err(ConfigError::MissingAdminTokens)));
}

#[test]
fn test_invalid_bind_addr_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_ADMIN_TOKEN=token\nQUESTBOARD_API_BIND_ADDR=not-an-addr\n",
    );

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();

    assert!(matches!(result, Err(ConfigError::InvalidBindAddr { .. })));
}

#[test]
fn test_blank_sync_api_key_means_open_endpoint() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_ADMIN_TOKEN=token\nQUESTBOARD_SYNC_API_KEY=   \n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert!(config.sync_api_key.is_none());
}

#[test]
fn test_completion_settings_are_loaded() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_ADMIN_TOKEN=token\n\
         QUESTBOARD_COMPLETION_API_KEY=sk-test\n\
         QUESTBOARD_COMPLETION_API_BASE=http://localhost:9999/v1\n\
         QUESTBOARD_COMPLETION_MODEL=test-model\n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.completion.api_base, "http://localhost:9999/v1");
    assert_eq!(config.completion.model, "test-model");
}

#[test]
fn test_non_prefixed_variables_are_ignored() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "QUESTBOARD_ADMIN_TOKEN=token\nDATABASE_URL=postgres://elsewhere/db\n",
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf())
        .load()
        .unwrap();

    // Only QUESTBOARD_-prefixed keys are read from env files.
    assert!(config.database_url.contains("questboard"));
}
