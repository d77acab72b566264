//! CLI error paths: exit codes and structured error output.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

fn pv_core(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pv-core").unwrap();
    cmd.env_remove("PV_SOLVER_CONFIG")
        .env_remove("PV_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env("PV_LOG", "off")
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path());
    cmd
}

/// Parses the JSON error envelope written to stderr.
fn stderr_error(output: &std::process::Output) -> Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("JSON error on stderr");
    serde_json::from_str(line).unwrap()
}

fn write_config(home: &TempDir, body: &str) -> String {
    let path = home.path().join("solver.json");
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

#[test]
fn invalid_model_exits_with_model_error() {
    let home = TempDir::new().unwrap();
    let output = pv_core(&home)
        .args(["solve", "--model", &fixture("bad_distribution.json")])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(12));
    let envelope = stderr_error(&output);
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["exit_code"], "ERR_MODEL");
    assert_eq!(envelope["error"]["code"], 22);
    assert_eq!(envelope["error"]["category"], "model");
}

#[test]
fn missing_model_exits_with_model_error() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("nope.json").display().to_string();
    let output = pv_core(&home)
        .args(["solve", "--model", &missing])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(12));
    let envelope = stderr_error(&output);
    assert_eq!(envelope["error"]["code"], 21);
    assert_eq!(envelope["error"]["context"]["path"], missing.as_str());
}

#[test]
fn invalid_config_exits_with_config_error() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, r#"{"schema_version": "1.0.0", "tolerance": -1.0}"#);
    let output = pv_core(&home)
        .args(["solve", "--model", &fixture("reset.json"), "--config", &config])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(11));
    let envelope = stderr_error(&output);
    assert_eq!(envelope["exit_code"], "ERR_CONFIG");
    assert_eq!(envelope["error"]["code"], 11);
}

#[test]
fn schema_mismatch_is_reported() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, r#"{"schema_version": "9.0.0"}"#);
    let output = pv_core(&home)
        .args(["check", "--config", &config])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(11));
    let envelope = stderr_error(&output);
    assert_eq!(envelope["error"]["code"], 12);
    assert_eq!(envelope["error"]["context"]["actual"], "9.0.0");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("absent.json").display().to_string();
    pv_core(&home)
        .args(["check", "--config", &missing])
        .assert()
        .code(11);
}

#[test]
fn tolerance_override_is_validated() {
    let home = TempDir::new().unwrap();
    pv_core(&home)
        .args(["solve", "--model", &fixture("reset.json"), "--tolerance", "0"])
        .assert()
        .code(11);
}

#[test]
fn belief_of_wrong_length_is_an_args_error() {
    let home = TempDir::new().unwrap();
    let output = pv_core(&home)
        .args(["solve", "--model", &fixture("reset.json"), "--belief", "0.2,0.3,0.5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(10));
    let envelope = stderr_error(&output);
    assert_eq!(envelope["exit_code"], "ERR_ARGS");
    assert_eq!(envelope["error"]["code"], 34);
}

#[test]
fn belief_that_is_not_a_distribution_is_rejected() {
    let home = TempDir::new().unwrap();
    pv_core(&home)
        .args(["solve", "--model", &fixture("reset.json"), "--belief", "0.7,0.7"])
        .assert()
        .code(10);
}

#[test]
fn weights_require_multi_objective() {
    let home = TempDir::new().unwrap();
    pv_core(&home)
        .args(["solve", "--model", &fixture("reset.json"), "--weights", "1"])
        .assert()
        .code(10);
}

#[test]
fn minimum_is_rejected_for_matrices() {
    let home = TempDir::new().unwrap();
    pv_core(&home)
        .args([
            "solve",
            "--model",
            &fixture("reset_mo.json"),
            "--multi-objective",
            "--min",
        ])
        .assert()
        .code(10);
}

#[test]
fn human_format_prints_fix_line() {
    let home = TempDir::new().unwrap();
    pv_core(&home)
        .args(["--format", "md", "solve", "--model", &fixture("bad_distribution.json")])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("Fix: "));
}
