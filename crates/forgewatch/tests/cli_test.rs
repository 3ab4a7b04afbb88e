//! Integration tests for the `forgewatch` CLI binary.
//!
//! Argument parsing, help output, shell completions, and error exit
//! codes, plus one login round trip against a wiremock backend.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `forgewatch` binary rooted at `home`.
///
/// Clears all `FORGEWATCH_*` env vars and points every config and data
/// directory at `home` so tests never touch the user's real files.
fn forgewatch_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("forgewatch");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("FORGEWATCH_PROFILE")
        .env_remove("FORGEWATCH_API_URL")
        .env_remove("FORGEWATCH_OUTPUT")
        .env_remove("FORGEWATCH_COLOR")
        .env_remove("FORGEWATCH_EMAIL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = forgewatch_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("machines")
                .and(predicate::str::contains("alerts"))
                .and(predicate::str::contains("chat"))
                .and(predicate::str::contains("login")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("forgewatch"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = forgewatch_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_machines_list_requires_login() {
    let home = tempfile::tempdir().unwrap();
    let output = forgewatch_cmd(home.path())
        .args(["machines", "list", "--api-url", "http://127.0.0.1:9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(text.contains("login"), "Expected a login hint:\n{text}");
}

#[test]
fn test_conflicting_filters_rejected() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .args(["machines", "list", "--type", "low", "--risk", "failure"])
        .assert()
        .code(2);
}

#[test]
fn test_zero_page_and_limit_rejected() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .args(["machines", "list", "--page", "0"])
        .assert()
        .code(2);
    forgewatch_cmd(home.path())
        .args(["machines", "list", "--limit", "0"])
        .assert()
        .code(2);
}

#[test]
fn test_config_set_and_show() {
    let home = tempfile::tempdir().unwrap();
    forgewatch_cmd(home.path())
        .args(["config", "set", "api_url", "http://localhost:8000"])
        .assert()
        .success();
    forgewatch_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api_url = \"http://localhost:8000\""));
}

#[test]
fn test_config_set_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let output = forgewatch_cmd(home.path())
        .args(["config", "set", "colour", "red"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_login_then_list_machines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({ "email": "ops@plant.io", "password": "hunter22" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "accessToken": "tok-cli",
                "user": { "id": 7, "username": "ops", "email": "ops@plant.io" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/machines"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer tok-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "machine_id": "M-1", "type": "L", "condition": { "status": "HEALTHY" } },
                { "machine_id": "M-2", "type": "H", "condition": { "status": "FAILURE" } }
            ],
            "pagination": {
                "current_page": 1, "total_pages": 1, "total_records": 2,
                "has_prev": false, "has_next": false
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let uri = server.uri();

    let login = forgewatch_cmd(home.path())
        .args(["login", "--email", "ops@plant.io", "--password-stdin"])
        .args(["--api-url", &uri])
        .write_stdin("hunter22\n")
        .output()
        .unwrap();
    assert!(login.status.success(), "{}", combined_output(&login));
    assert!(combined_output(&login).contains("Logged in as ops"));

    let list = forgewatch_cmd(home.path())
        .args(["machines", "list", "-o", "plain", "--api-url", &uri])
        .output()
        .unwrap();
    assert!(list.status.success(), "{}", combined_output(&list));
    assert_eq!(String::from_utf8_lossy(&list.stdout).trim(), "M-1\nM-2");
}

/// Mount a login endpoint and sign in through the CLI.
async fn sign_in(server: &MockServer, home: &Path) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "accessToken": "tok-cli",
                "user": { "id": 7, "username": "ops", "email": "ops@plant.io" }
            }
        })))
        .mount(server)
        .await;
    let login = forgewatch_cmd(home)
        .args(["login", "--email", "ops@plant.io", "--password-stdin"])
        .args(["--api-url", &server.uri()])
        .write_stdin("hunter22\n")
        .output()
        .unwrap();
    assert!(login.status.success(), "{}", combined_output(&login));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resolve_sends_one_request() {
    let server = MockServer::start().await;
    let home = tempfile::tempdir().unwrap();
    sign_in(&server, home.path()).await;

    Mock::given(method("GET"))
        .and(path("/api/alerts/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": 5, "severity": "HIGH", "resolved": false, "type": "ML_POWER_ANOMALY" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/5/resolve"))
        .and(header("authorization", "Bearer tok-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let output = forgewatch_cmd(home.path())
        .args(["alerts", "resolve", "5", "--yes", "--api-url", &server.uri()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Alert 5 resolved"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resolve_skips_already_resolved_alert() {
    let server = MockServer::start().await;
    let home = tempfile::tempdir().unwrap();
    sign_in(&server, home.path()).await;

    Mock::given(method("GET"))
        .and(path("/api/alerts/6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ { "id": 6, "severity": "LOW", "resolved": true, "type": "ML_POWER_ANOMALY" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/alerts/6/resolve"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = forgewatch_cmd(home.path())
        .args(["alerts", "resolve", "6", "--yes", "--api-url", &server.uri()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Alert 6 is already resolved"));
}
