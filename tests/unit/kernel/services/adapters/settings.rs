use super::*;
use serde_json::json;

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = load_settings(&dir.path().join("absent.json")).unwrap();
    assert!(settings.project_name.is_none());
    assert_eq!(settings.editor_defaults.get("tabSize"), Some(&json!(4)));
}

#[test]
fn test_load_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(
        &path,
        r#"{ "project_name": "demo", "editor_defaults": { "tabSize": 2 } }"#,
    )
    .unwrap();

    let settings = load_settings(&path).unwrap();
    assert_eq!(settings.project_name.as_deref(), Some("demo"));
    assert_eq!(settings.editor_defaults.get("tabSize"), Some(&json!(2)));
    // A provided table replaces the built-in one.
    assert!(!settings.editor_defaults.contains_key("theme"));
}

#[test]
fn test_partial_file_keeps_default_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(&path, r#"{ "project_name": "demo" }"#).unwrap();

    let settings = load_settings(&path).unwrap();
    assert_eq!(settings.editor_defaults.get("theme"), Some(&json!("default")));
}

#[test]
fn test_malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SETTINGS_FILE);
    std::fs::write(&path, "{ not json").unwrap();

    let err = load_settings(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains(SETTINGS_FILE));
}

#[test]
fn test_settings_path_ends_with_app_file() {
    if let Some(path) = get_settings_path() {
        assert!(path.ends_with(format!("{SETTINGS_DIR}/{SETTINGS_FILE}")));
    }
}
