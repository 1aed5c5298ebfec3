//! Unit tests for the SettingsEngine: file layer, environment overrides and
//! window reconciliation.
//!
//! Environment lookups are injected through `resolve_with`, so these tests
//! never read or mutate the process environment.

use std::collections::HashMap;
use std::path::PathBuf;

use historysync::services::settings_engine::{
    SettingsEngine, SettingsEngineTrait, ENV_DOMAIN, ENV_ENDPOINT, ENV_HISTORY_DB, ENV_POLL_SECS,
    ENV_WINDOW_SECS,
};
use historysync::types::errors::SettingsError;
use historysync::types::settings::SyncSettings;
use serde_json::json;
use tempfile::TempDir;

/// Helper: a SettingsEngine whose file lives in `dir`.
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    SettingsEngine::new(Some(dir.path().join("settings.json")))
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_without_file_or_env() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load_file().unwrap();

    let settings = engine.resolve_with(env(&[])).unwrap();
    assert_eq!(settings, SyncSettings::default());
    assert_eq!(settings.poll_interval_secs, 3600);
    assert_eq!(settings.window_secs, 3600);
    assert_eq!(settings.request_timeout_secs, 60);
    assert!(settings.endpoint.is_none());
    assert!(settings.history_db.ends_with("Library/Safari/History.db"));
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{ "endpoint": "https://ingest.example.dev", "poll_interval_secs": 600 }"#,
    )
    .unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load_file().unwrap();

    let settings = engine.resolve_with(env(&[])).unwrap();
    assert_eq!(settings.endpoint.as_deref(), Some("https://ingest.example.dev"));
    assert_eq!(settings.poll_interval_secs, 600);
    assert_eq!(settings.window_secs, 3600);
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{ "endpoint": "https://file.example.dev" }"#,
    )
    .unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load_file().unwrap();

    let settings = engine
        .resolve_with(env(&[
            (ENV_ENDPOINT, "https://env.example.dev"),
            (ENV_HISTORY_DB, "/tmp/History.db"),
            (ENV_POLL_SECS, "120"),
            (ENV_WINDOW_SECS, "900"),
        ]))
        .unwrap();

    assert_eq!(settings.endpoint.as_deref(), Some("https://env.example.dev"));
    assert_eq!(settings.history_db, PathBuf::from("/tmp/History.db"));
    assert_eq!(settings.poll_interval_secs, 120);
    assert_eq!(settings.window_secs, 900);
    assert_eq!(
        engine.get_settings().endpoint.as_deref(),
        Some("https://file.example.dev"),
        "overrides never leak into the file layer"
    );
}

#[test]
fn test_legacy_domain_variable_is_fallback() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);

    let settings = engine
        .resolve_with(env(&[(ENV_DOMAIN, "https://legacy.example.dev")]))
        .unwrap();
    assert_eq!(settings.endpoint.as_deref(), Some("https://legacy.example.dev"));

    let settings = engine
        .resolve_with(env(&[
            (ENV_DOMAIN, "https://legacy.example.dev"),
            (ENV_ENDPOINT, "https://new.example.dev"),
        ]))
        .unwrap();
    assert_eq!(settings.endpoint.as_deref(), Some("https://new.example.dev"));
}

#[test]
fn test_blank_env_values_are_ignored() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);

    let settings = engine
        .resolve_with(env(&[(ENV_ENDPOINT, "  "), (ENV_POLL_SECS, "")]))
        .unwrap();
    assert!(settings.endpoint.is_none());
    assert_eq!(settings.poll_interval_secs, 3600);
}

#[test]
fn test_non_numeric_env_value_is_invalid() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);

    let result = engine.resolve_with(env(&[(ENV_POLL_SECS, "hourly")]));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_zero_poll_interval_is_invalid() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);

    let result = engine.resolve_with(env(&[(ENV_POLL_SECS, "0")]));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_window_is_raised_to_poll_interval() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);

    let settings = engine
        .resolve_with(env(&[(ENV_POLL_SECS, "7200"), (ENV_WINDOW_SECS, "3600")]))
        .unwrap();
    assert_eq!(settings.window_secs, 7200);
}

#[test]
fn test_malformed_file_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
    let mut engine = engine_in_temp(&dir);

    assert!(matches!(engine.load_file(), Err(SettingsError::Serialization(_))));
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load_file().unwrap();
        engine
            .set_value("endpoint", json!("https://ingest.example.dev"))
            .unwrap();
        engine.set_value("window_secs", json!(7200)).unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    engine.load_file().unwrap();
    assert_eq!(
        engine.get_settings().endpoint.as_deref(),
        Some("https://ingest.example.dev")
    );
    assert_eq!(engine.get_settings().window_secs, 7200);
}

#[test]
fn test_set_value_rejects_unknown_key_and_bad_type() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    assert!(matches!(
        engine.set_value("no_such_key", json!(1)),
        Err(SettingsError::InvalidValue(_))
    ));
    assert!(matches!(
        engine.set_value("poll_interval_secs", json!("soon")),
        Err(SettingsError::InvalidValue(_))
    ));
    assert_eq!(engine.get_settings(), &SyncSettings::default());
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.set_value("poll_interval_secs", json!(60)).unwrap();

    engine.reset().unwrap();
    assert_eq!(engine.get_settings(), &SyncSettings::default());

    let mut reloaded = engine_in_temp(&dir);
    reloaded.load_file().unwrap();
    assert_eq!(reloaded.get_settings(), &SyncSettings::default());
}

#[test]
fn test_config_path_matches_override() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in_temp(&dir);
    assert_eq!(engine.get_config_path(), dir.path().join("settings.json"));
}
