mod common;
use crate::common::TestResult;

use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use histdag::config::{ConfigFile, FilterSection, load_and_validate, load_from_str};
use histdag::errors::HistdagError;
use histdag::types::BackoffKind;

fn write_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Histdag.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

fn validate(toml: &str) -> Result<ConfigFile, HistdagError> {
    ConfigFile::try_from(load_from_str(toml)?)
}

fn config_error(toml: &str) -> String {
    match validate(toml) {
        Err(HistdagError::ConfigError(msg)) => msg,
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn minimal_config_gets_defaults() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[server]
base_url = "https://usegalaxy.org"
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.server.base_url.as_str(), "https://usegalaxy.org/");
    assert_eq!(cfg.server.connect_timeout, Duration::from_secs(10));
    assert_eq!(cfg.server.request_timeout, Duration::from_secs(30));
    assert_eq!(cfg.poll.backoff.kind, BackoffKind::Exponential);
    assert_eq!(cfg.poll.backoff.initial, Duration::from_secs(2));
    assert_eq!(cfg.poll.backoff.max, Duration::from_secs(30));
    assert_eq!(cfg.poll.max_consecutive_failures, 5);
    assert_eq!(cfg.poll.max_attempts, None);
    assert_eq!(cfg.poll.max_duration, None);
    assert_eq!(cfg.page_size, None);
    assert_eq!(cfg.filter, FilterSection::default());
    Ok(())
}

#[test]
fn full_config_round_trips_into_settings() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[server]
base_url = "http://localhost:8080/galaxy"
api_key = "abc123"
connect_timeout = "500ms"
request_timeout = "1m"

[poll]
initial_interval = "1s"
max_interval = "20s"
backoff = "linear"
backoff_step = "3s"
max_consecutive_failures = 2
max_attempts = 100
max_duration = "2h"
page_size = 500

[filter]
deleted = false
visible = true
"#,
    );

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.server.api_key.as_deref(), Some("abc123"));
    assert_eq!(cfg.server.connect_timeout, Duration::from_millis(500));
    assert_eq!(cfg.server.request_timeout, Duration::from_secs(60));
    assert_eq!(cfg.poll.backoff.kind, BackoffKind::Linear);
    assert_eq!(cfg.poll.backoff.step, Duration::from_secs(3));
    assert_eq!(cfg.poll.backoff.delay(2), Duration::from_secs(7));
    assert_eq!(cfg.poll.max_consecutive_failures, 2);
    assert_eq!(cfg.poll.max_attempts, Some(100));
    assert_eq!(cfg.poll.max_duration, Some(Duration::from_secs(7200)));
    assert_eq!(cfg.page_size, Some(500));
    assert_eq!(
        cfg.filter,
        FilterSection {
            deleted: Some(false),
            visible: Some(true),
        }
    );
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, HistdagError::IoError(_)), "{err:?}");
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let (_dir, path) = write_config("[server\nbase_url = 1");
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, HistdagError::TomlError(_)), "{err:?}");
}

#[test]
fn missing_server_section_is_rejected() {
    assert!(matches!(
        load_from_str("[poll]\ninitial_interval = \"1s\"\n"),
        Err(HistdagError::TomlError(_))
    ));
}

#[test]
fn invalid_values_are_config_errors() {
    let server = "[server]\nbase_url = \"https://example.org\"\n";

    let msg = config_error("[server]\nbase_url = \"not a url\"\n");
    assert!(msg.contains("base_url"), "{msg}");

    let msg = config_error("[server]\nbase_url = \"ftp://example.org\"\n");
    assert!(msg.contains("http or https"), "{msg}");

    let poll = "[poll]\ninitial_interval = \"10s\"\nmax_interval = \"5s\"\n";
    let msg = config_error(&format!("{server}{poll}"));
    assert!(msg.contains("must not exceed"), "{msg}");

    let msg = config_error(&format!("{server}[poll]\ninitial_interval = \"0s\"\n"));
    assert!(msg.contains("greater than zero"), "{msg}");

    let msg = config_error(&format!("{server}[poll]\nmax_interval = \"5 parsecs\"\n"));
    assert!(msg.contains("[poll].max_interval"), "{msg}");

    let msg = config_error(&format!("{server}[poll]\nbackoff_factor = 0.5\n"));
    assert!(msg.contains("backoff_factor"), "{msg}");

    let msg = config_error(&format!("{server}[poll]\nmax_consecutive_failures = 0\n"));
    assert!(msg.contains("max_consecutive_failures"), "{msg}");

    let msg = config_error(&format!("{server}[poll]\npage_size = 0\n"));
    assert!(msg.contains("page_size"), "{msg}");
}

#[test]
fn unknown_backoff_kind_is_rejected() {
    let toml = "[server]\nbase_url = \"https://example.org\"\n[poll]\nbackoff = \"fibonacci\"\n";
    assert!(matches!(load_from_str(toml), Err(HistdagError::TomlError(_))));
}
