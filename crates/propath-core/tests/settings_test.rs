//! Integration tests for settings files

use std::io::Write;

use propath_core::{ConfigRegistry, Error, ErrorKind, Settings};
use tempfile::NamedTempFile;

fn write_settings(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_settings(
        r#"
[properties]
idle_expiry_secs = 30
immutables = false
warn_ambiguous = false

[map_entry]
key_column = "k"
value_column = "v"
"#,
    );

    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.properties.idle_expiry_secs, 30);
    assert!(!settings.properties.immutables);
    assert!(!settings.properties.warn_ambiguous);

    let ctx = ConfigRegistry::new(settings).unwrap();
    assert!(ctx.immutables().is_none());
    assert_eq!(ctx.map_entry().key_column().as_deref(), Some("k"));
    assert_eq!(ctx.map_entry().value_column().as_deref(), Some("v"));
}

#[test]
fn test_load_empty_file_defaults() {
    let file = write_settings("");
    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Settings::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_blank_column_rejected() {
    let file = write_settings("[map_entry]\nkey_column = \"  \"\n");
    let err = Settings::load(file.path()).unwrap_err();
    assert_eq!(err.to_string(), "Configuration error: map_entry.key_column cannot be blank");
}

#[test]
fn test_registry_rejects_invalid_settings() {
    let mut settings = Settings::default();
    settings.properties.idle_expiry_secs = 0;
    assert!(matches!(ConfigRegistry::new(settings), Err(Error::Config(_))));
}
