use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use code_docu::load_config::{load_config, load_or_default, API_KEY_ENV};

/// A full config file plus the env secret produces a merged CliConfig.
#[test]
#[serial]
fn test_load_config_success_injects_env_api_key() {
    let config_yaml = r#"
storage:
  files_dir: ./tmp/files
  database: ./tmp/runs.db
workflow:
  extension: inc
  excluded_dir: fixtures
  module_kind: Drupal 10
generator:
  base_url: http://localhost:8080/v1/
  model: gpt-4o
  temperature: 0.2
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();
    env::set_var(API_KEY_ENV, "top-secret-test-key");

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.storage.files_dir, PathBuf::from("./tmp/files"));
    assert_eq!(config.storage.database, PathBuf::from("./tmp/runs.db"));
    assert_eq!(config.storage.run_dir("abc"), PathBuf::from("./tmp/files/unzip/abc"));
    assert_eq!(config.workflow.extension, "inc");
    assert_eq!(config.workflow.excluded_dir, "fixtures");
    assert_eq!(config.workflow.module_kind.as_deref(), Some("Drupal 10"));
    // Unset workflow keys keep their defaults.
    assert_eq!(config.workflow.docs_dir, "docu");
    assert_eq!(config.workflow.overview_filename, "README.md");
    assert_eq!(config.workflow.archive_name, "code_documentation.zip");
    assert_eq!(config.generator.model, "gpt-4o");
    assert_eq!(config.generator.api_key.as_deref(), Some("top-secret-test-key"));

    env::remove_var(API_KEY_ENV);
}

/// Missing sections fall back to defaults; a missing secret is not an error at load time.
#[test]
#[serial]
fn test_load_config_defaults_for_missing_sections() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "workflow:\n  extension: php\n").unwrap();
    env::remove_var(API_KEY_ENV);

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.storage.files_dir, PathBuf::from("files"));
    assert_eq!(config.generator.base_url, "https://api.openai.com/v1");
    assert_eq!(config.generator.model, "gpt-4o-mini");
    assert_eq!(config.generator.api_key, None);
}

#[test]
#[serial]
fn test_load_or_default_without_file() {
    env::set_var(API_KEY_ENV, "k");
    let config = load_or_default(None).expect("Defaults should load");
    assert_eq!(config.workflow.extension, "php");
    assert_eq!(config.generator.api_key.as_deref(), Some("k"));
    env::remove_var(API_KEY_ENV);
}

/// If the config file is not valid YAML, load_config errors and reports as such.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
fn test_load_config_errors_for_missing_file() {
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"), "got: {err}");
}

/// An overview name a per-file document could derive is refused at load time.
#[test]
#[serial]
fn test_load_config_rejects_reachable_overview_name() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "workflow:\n  overview_filename: index.md\n").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Invalid workflow config"), "got: {msg}");
    assert!(msg.contains("index.md"), "got: {msg}");
}
