use std::fs;

use assert_matches::assert_matches;
use text_blast::{AppConfig, CanonicalField, ConfigError, ImportMode, NameSchema, RefreshPolicy};

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("text-blast.toml");
    let mut config = AppConfig {
        endpoint: "https://api.example.com/DEV/messages".into(),
        name_schema: NameSchema::Split,
        import_mode: ImportMode::Extend,
        selection_on_refresh: RefreshPolicy::Clear,
        delimiter: ';',
        ..Default::default()
    };
    config
        .headers
        .insert("Mobile".into(), CanonicalField::PhoneNumber);
    config.save_to(&path).expect("save");

    let loaded = AppConfig::load_from(&path).expect("load");
    assert_eq!(loaded, config);
    let settings = loaded.form_settings().expect("settings");
    assert_eq!(settings.delimiter, b';');
    assert_eq!(settings.import_mode, ImportMode::Extend);
}

#[test]
fn json_config_is_accepted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{"endpoint": "localhost:3000/messages", "headers": {"Tel": "phone_number", "Who": "name"}}"#,
    )
    .expect("write");
    let config = AppConfig::load_from(&path).expect("load");
    assert_eq!(config.headers.len(), 2);
    assert_eq!(config.name_schema, NameSchema::Single);
    assert_eq!(
        config.endpoint_url().expect("url").as_str(),
        "https://localhost:3000/messages"
    );
}

#[test]
fn broken_toml_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("text-blast.toml");
    fs::write(&path, "name_schema = \"both\"\n").expect("write");
    assert_matches!(AppConfig::load_from(&path), Err(ConfigError::Toml(_)));
}

#[test]
fn missing_endpoint_is_reported() {
    let config = AppConfig::default();
    assert_matches!(config.endpoint_url(), Err(ConfigError::MissingEndpoint));
}
