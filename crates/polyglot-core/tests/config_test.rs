//! Tests for the polyglot configuration system.

use std::sync::Mutex;

use polyglot_core::config::{ConfigOverrides, PolyglotConfig};
use polyglot_core::errors::ConfigError;

/// Serializes tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

fn clear_polyglot_env_vars() {
    for key in [
        "POLYGLOT_NORMALIZER_CACHE_ENABLED",
        "POLYGLOT_NORMALIZER_CACHE_CAPACITY",
        "POLYGLOT_NORMALIZER_MAX_SOURCE_BYTES",
        "POLYGLOT_NORMALIZER_LANGUAGES",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_polyglot_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("polyglot.toml"),
        r#"
[normalizer]
cache_capacity = 32
max_source_bytes = 1000
enabled_languages = ["python", "java"]
"#,
    )
    .unwrap();

    std::env::set_var("POLYGLOT_NORMALIZER_CACHE_CAPACITY", "64");

    let overrides = ConfigOverrides {
        max_source_bytes: Some(5000),
        ..Default::default()
    };
    let config = PolyglotConfig::load(dir.path(), Some(&overrides)).unwrap();

    // Env beats project file.
    assert_eq!(config.normalizer.cache_capacity, Some(64));
    // Overrides beat everything.
    assert_eq!(config.normalizer.max_source_bytes, Some(5000));
    // Project file beats defaults.
    assert_eq!(config.normalizer.enabled_languages, vec!["python", "java"]);
    assert!(config.normalizer.is_language_enabled("java"));
    assert!(!config.normalizer.is_language_enabled("javascript"));

    clear_polyglot_env_vars();
}

#[test]
fn test_missing_files_fall_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_polyglot_env_vars();

    let dir = tempdir();
    let config = PolyglotConfig::load(dir.path(), None).unwrap();

    assert!(config.normalizer.effective_cache_enabled());
    assert_eq!(config.normalizer.effective_cache_capacity(), 16);
    assert_eq!(config.normalizer.effective_max_source_bytes(), 4 * 1_048_576);
    for language in ["python", "javascript", "java"] {
        assert!(config.normalizer.is_language_enabled(language));
    }
    assert!(!config.normalizer.is_language_enabled("ruby"));
}

#[test]
fn test_env_language_list() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_polyglot_env_vars();

    let dir = tempdir();
    std::env::set_var("POLYGLOT_NORMALIZER_LANGUAGES", "Python, javascript");
    let config = PolyglotConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.normalizer.enabled_languages, vec!["python", "javascript"]);

    clear_polyglot_env_vars();
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_polyglot_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("polyglot.toml"), "this is not valid toml {{{{").unwrap();

    match PolyglotConfig::load(dir.path(), None) {
        Err(ConfigError::ParseError { .. }) => {}
        other => panic!("Expected ParseError, got: {:?}", other),
    }
}

#[test]
fn test_zero_capacity_rejected() {
    let result = PolyglotConfig::from_toml("[normalizer]\ncache_capacity = 0\n");
    match result {
        Err(ConfigError::ValidationFailed { field, .. }) => {
            assert_eq!(field, "normalizer.cache_capacity");
        }
        other => panic!("Expected ValidationFailed, got: {:?}", other),
    }
}

#[test]
fn test_unknown_language_rejected() {
    let result = PolyglotConfig::from_toml("[normalizer]\nenabled_languages = [\"cobol\"]\n");
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_unknown_keys_ignored() {
    let config = PolyglotConfig::from_toml(
        r#"
[normalizer]
cache_enabled = false
future_option = "x"

[future_section]
flag = true
"#,
    )
    .unwrap();
    assert!(!config.normalizer.effective_cache_enabled());
}

#[test]
fn test_toml_round_trip() {
    let config = PolyglotConfig::from_toml("[normalizer]\ncache_capacity = 8\n").unwrap();
    let text = config.to_toml().unwrap();
    let back = PolyglotConfig::from_toml(&text).unwrap();
    assert_eq!(back.normalizer.cache_capacity, Some(8));
}
