//! Smoke tests for the smarttalk-e2e CLI
//!
//! None of these launch a browser.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the smarttalk-e2e binary with a clean environment
fn smarttalk_e2e() -> Command {
    let mut cmd = Command::cargo_bin("smarttalk-e2e").expect("smarttalk-e2e binary should exist");
    cmd.env_remove("SMARTTALK_ORIGIN")
        .env_remove("SMARTTALK_ARTIFACTS")
        .env_remove("CHROMIUM_PATH")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    smarttalk_e2e()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    smarttalk_e2e()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_no_args_fails() {
    smarttalk_e2e().assert().failure();
}

#[test]
fn test_run_help() {
    smarttalk_e2e()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-fast"))
        .stdout(predicate::str::contains("--headed"))
        .stdout(predicate::str::contains("SMARTTALK_ORIGIN"));
}

// ============================================================================
// list / config
// ============================================================================

#[test]
fn test_list_shows_scenarios() {
    smarttalk_e2e()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Flujo E2E del Chat SmartTalk"))
        .stdout(predicate::str::contains("Validar la pantalla de inicio del chat"))
        .stdout(predicate::str::contains("Ingreso al chat con nombre 'John Cypress'"))
        .stdout(predicate::str::contains("Escribir mensaje desde Cypress sin enviarlo"))
        .stdout(predicate::str::contains("B1-chat-ingresado.png"));
}

#[test]
fn test_list_uses_origin_override() {
    smarttalk_e2e()
        .args(["list", "--origin", "http://127.0.0.1:5173"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(http://127.0.0.1:5173)"));
}

#[test]
fn test_config_prints_defaults() {
    smarttalk_e2e()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("origin: http://localhost:3000"))
        .stdout(predicate::str::contains("artifacts_dir: artifacts/screenshots"));
}

#[test]
fn test_config_reads_file_and_env() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("run.yaml");
    fs::write(&path, "implicit_wait_ms: 1234\nbrowser:\n  sandbox: false\n").unwrap();

    smarttalk_e2e()
        .env("SMARTTALK_ORIGIN", "http://localhost:8080")
        .args(["config", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("origin: http://localhost:8080"))
        .stdout(predicate::str::contains("implicit_wait_ms: 1234"))
        .stdout(predicate::str::contains("sandbox: false"));
}

#[test]
fn test_config_rejects_bad_origin() {
    smarttalk_e2e()
        .args(["config", "--origin", "localhost:3000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("origin must be an http(s) URL"));
}

#[test]
fn test_missing_config_file() {
    smarttalk_e2e()
        .args(["config", "--config", "/nonexistent/run.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ============================================================================
// run argument errors (no browser launched)
// ============================================================================

#[test]
fn test_run_unknown_filter() {
    smarttalk_e2e()
        .args(["run", "--filter", "no such scenario"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no scenario matches"));
}

#[test]
fn test_run_invalid_format() {
    smarttalk_e2e()
        .args(["run", "--format", "html"])
        .assert()
        .failure();
}
