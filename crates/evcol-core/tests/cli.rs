//! CLI E2E tests for the evcol binary.
//!
//! Validates:
//! - `convert` writes an artifact and prints a JSON report
//! - `inspect` reports rows and per-column compression
//! - `triggers` writes filtered timestamps
//! - `config show|validate|schema` output and exit codes
//! - Error paths map to stable exit codes

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

// ============================================================================
// Helpers
// ============================================================================

/// Get a Command for the evcol binary, isolated from the user's config.
fn evcol(config_home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("evcol");
    cmd.timeout(Duration::from_secs(60))
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("EVCOL_CONFIG")
        .env_remove("EVCOL_X_OFFSET")
        .env_remove("EVCOL_Y_OFFSET")
        .env_remove("EVCOL_CAPACITY_HINT")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("parse JSON")
}

// ============================================================================
// convert / inspect
// ============================================================================

#[test]
fn test_convert_then_inspect() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("event.csv");
    let output = dir.path().join("h5data").join("1.parquet");
    fs::write(&input, "340,60,0,0\n341,61,1,500\n342,62,1,1500\n").unwrap();

    let report = stdout_json(evcol(dir.path()).args([
        "convert",
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--capacity-hint",
        "2",
        "--delta-t",
        "1000",
    ]));
    assert_eq!(report["ingest"]["events"], 3);
    assert_eq!(report["ingest"]["growth_events"], 1);
    assert_eq!(report["write"]["rows"], 3);
    assert!(output.is_file());

    let info = stdout_json(evcol(dir.path()).args(["inspect", output.to_str().unwrap()]));
    assert_eq!(info["rows"], 3);
    let names: Vec<_> = info["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["x", "y", "p", "t"]);
}

#[test]
fn test_convert_negative_offset_flag() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("event.csv");
    let output = dir.path().join("out.parquet");
    fs::write(&input, "0,0,1,0\n").unwrap();

    evcol(dir.path())
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--x-offset",
            "-5",
            "--y-offset",
            "0",
            "--capacity-hint",
            "16",
        ])
        .assert()
        .success();
    let columns = evcol_store::read_columns(&output).unwrap();
    assert_eq!(columns.x, vec![5]);
    assert_eq!(columns.y, vec![0]);
}

#[test]
fn test_convert_missing_input_is_config_error() {
    let dir = tempdir().unwrap();
    evcol(dir.path())
        .args(["convert", "--output", "out.parquet"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("no input path"));
}

#[test]
fn test_convert_nonexistent_input_is_source_error() {
    let dir = tempdir().unwrap();
    evcol(dir.path())
        .args([
            "convert",
            "--input",
            dir.path().join("absent.csv").to_str().unwrap(),
            "--output",
            dir.path().join("out.parquet").to_str().unwrap(),
        ])
        .assert()
        .code(11);
}

#[test]
fn test_convert_reject_policy_exit_code() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("event.csv");
    let output = dir.path().join("out.parquet");
    fs::write(&input, "5,10,0,0\n").unwrap();

    evcol(dir.path())
        .args([
            "convert",
            "--input",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--underflow",
            "reject",
            "--capacity-hint",
            "16",
        ])
        .assert()
        .code(13)
        .stderr(predicate::str::contains("out of u16 range"));
    assert!(!output.exists());
}

#[test]
fn test_inspect_non_artifact_fails() {
    let dir = tempdir().unwrap();
    let junk = dir.path().join("junk.parquet");
    fs::write(&junk, "nope").unwrap();
    evcol(dir.path())
        .args(["inspect", junk.to_str().unwrap()])
        .assert()
        .code(14);
}

// ============================================================================
// triggers
// ============================================================================

#[test]
fn test_triggers_filters_polarity() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("triggers.csv");
    let output = dir.path().join("1.txt");
    fs::write(&input, "0,10\n1,15\n0,20\n").unwrap();

    let summary = stdout_json(evcol(dir.path()).args([
        "triggers",
        "--input",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--polarity",
        "1",
    ]));
    assert_eq!(summary["kept"], 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "15\n");
}

#[test]
fn test_triggers_rejects_bad_polarity() {
    let dir = tempdir().unwrap();
    evcol(dir.path())
        .args(["triggers", "-i", "a.csv", "-o", "b.txt", "--polarity", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 0, 1 or all"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let dir = tempdir().unwrap();
    let json = stdout_json(evcol(dir.path()).args(["config", "show"]));
    assert_eq!(json["origin"]["kind"], "defaults");
    assert_eq!(json["config"]["x_offset"], 340);
    assert_eq!(json["config"]["y_offset"], 60);
    assert_eq!(json["config"]["capacity_hint"], 60_000_000);
    assert_eq!(json["config"]["underflow"], "wrap");
}

#[test]
fn test_config_show_reads_user_config_dir() {
    let dir = tempdir().unwrap();
    let config_dir = dir.path().join("evcol");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.json"), r#"{"x_offset": 12}"#).unwrap();

    let json = stdout_json(evcol(dir.path()).args(["config", "show"]));
    assert_eq!(json["origin"]["kind"], "file");
    assert_eq!(json["config"]["x_offset"], 12);
}

#[test]
fn test_config_validate_reports_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"capacity_hint": 0, "source": {"delta_t": -1}}"#).unwrap();

    let output = evcol(dir.path())
        .args(["config", "validate", "--config", path.to_str().unwrap()])
        .assert()
        .code(10)
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);
}

#[test]
fn test_config_invalid_json_exit_code() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{").unwrap();
    evcol(dir.path())
        .args(["config", "show", "--config", path.to_str().unwrap()])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("broken.json"));
}

#[test]
fn test_config_schema_names_fields() {
    let dir = tempdir().unwrap();
    let json = stdout_json(evcol(dir.path()).args(["config", "schema"]));
    let props = json["properties"].as_object().expect("properties");
    for field in ["x_offset", "y_offset", "capacity_hint", "underflow", "source", "writer"] {
        assert!(props.contains_key(field), "schema missing {field}");
    }
}
