//! Integration tests for the `resin` CLI binary.
//!
//! Argument parsing, help output, local-only commands, and error exit codes
//! run without a network. The `channel` and `logs` tests point the binary at
//! a wiremock server standing in for both the resin API and PubNub.
#![allow(clippy::unwrap_used)]

use std::io::Write as _;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `{"username":"gordon","id":7,"email":"gordon@example.com","exp":4102444800}`
const VALID_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.\
    eyJ1c2VybmFtZSI6ImdvcmRvbiIsImlkIjo3LCJlbWFpbCI6ImdvcmRvbkBleGFtcGxlLmNvbSIsImV4cCI6NDEwMjQ0NDgwMH0.\
    c2ln";

/// `{"username":"gordon","id":7,"exp":1000}`
const EXPIRED_TOKEN: &str =
    "eyJhbGciOiJIUzI1NiJ9.eyJ1c2VybmFtZSI6ImdvcmRvbiIsImlkIjo3LCJleHAiOjEwMDB9.c2ln";

/// Build a [`Command`] for the `resin` binary with env isolation.
///
/// Clears all `RESIN_*` env vars and points config and data directories at
/// a nonexistent path so tests never touch the user's real configuration.
fn resin_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("resin");
    cmd.env("HOME", "/tmp/resin-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/resin-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/resin-cli-test-nonexistent")
        .env_remove("RESIN_CONFIG")
        .env_remove("RESIN_DATA_DIRECTORY")
        .env_remove("RESIN_TOKEN")
        .env_remove("RESIN_PROFILE")
        .env_remove("RESIN_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

async fn mount_device(server: &MockServer, uuid: &str, logs_channel: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/v1/device"))
        .and(query_param("$filter", format!("uuid eq '{uuid}'")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "d": [{ "uuid": uuid, "logs_channel": logs_channel }]
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = resin_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    resin_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("live logs")
            .and(predicate::str::contains("logs"))
            .and(predicate::str::contains("channel"))
            .and(predicate::str::contains("whoami")),
    );
}

#[test]
fn test_version_flag() {
    resin_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("resin"));
}

#[test]
fn test_logs_requires_uuid() {
    resin_cmd().arg("logs").assert().code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    resin_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_invalid_shell() {
    resin_cmd()
        .args(["completions", "tcsh"])
        .assert()
        .failure();
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    resin_cmd()
        .args(["config", "path"])
        .env("RESIN_CONFIG", "/tmp/resin-cli-test/config.toml")
        .env("RESIN_DATA_DIRECTORY", "/tmp/resin-cli-test/data")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("config: /tmp/resin-cli-test/config.toml")
                .and(predicate::str::contains("token:  /tmp/resin-cli-test/data/token")),
        );
}

#[test]
fn test_config_path_with_broken_file() {
    let file = config_file("defaults = [not toml");

    resin_cmd()
        .args(["config", "path"])
        .env("RESIN_CONFIG", file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "config: {}",
            file.path().display()
        )));

    resin_cmd()
        .args(["config", "show"])
        .env("RESIN_CONFIG", file.path())
        .assert()
        .failure();
}

#[test]
fn test_config_show_redacts_tokens() {
    let file = config_file(
        r#"
        [profiles.default]
        api_url = "https://api.resinstaging.io"
        token = "super-secret"
        "#,
    );

    resin_cmd()
        .args(["config", "show"])
        .env("RESIN_CONFIG", file.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("api.resinstaging.io")
                .and(predicate::str::contains("super-secret").not()),
        );
}

#[test]
fn test_unknown_profile() {
    let output = resin_cmd()
        .args(["--profile", "nope", "channel", "abc"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Profile 'nope' not found"), "{text}");
}

// ── Authentication ──────────────────────────────────────────────────

#[test]
fn test_logs_without_token() {
    let output = resin_cmd().args(["logs", "abc"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected AUTH exit code");
    let text = combined_output(&output);
    assert!(text.contains("No session token"), "{text}");
}

#[test]
fn test_whoami() {
    resin_cmd()
        .args(["whoami"])
        .env("RESIN_TOKEN", VALID_TOKEN)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("username: gordon")
                .and(predicate::str::contains("email:    gordon@example.com"))
                .and(predicate::str::contains("2100-01-01")),
        );
}

#[test]
fn test_whoami_json_expired() {
    let output = resin_cmd()
        .args(["whoami", "--json", "--token", EXPIRED_TOKEN])
        .output()
        .unwrap();
    assert!(output.status.success());

    let claims: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(claims["username"], "gordon");
    assert_eq!(claims["id"], 7);
    assert_eq!(claims["expired"], true);
}

#[test]
fn test_whoami_rejects_garbage_token() {
    resin_cmd()
        .args(["whoami", "--token", "not-a-jwt"])
        .assert()
        .code(3);
}

#[test]
fn test_token_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("token"), format!("{VALID_TOKEN}\n")).unwrap();

    resin_cmd()
        .args(["whoami"])
        .env("RESIN_DATA_DIRECTORY", dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("username: gordon"));
}

// ── Against a mock API ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_channel_with_override() {
    let server = MockServer::start().await;
    mount_device(&server, "49b2a76b", Some("f00d")).await;

    resin_cmd()
        .args(["channel", "49b2a76b", "--api-url", &server.uri()])
        .args(["--token", VALID_TOKEN])
        .assert()
        .success()
        .stdout("device-f00d-logs\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_channel_unknown_device() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "d": [] })))
        .mount(&server)
        .await;

    let output = resin_cmd()
        .args(["channel", "missing", "--api-url", &server.uri()])
        .args(["--token", VALID_TOKEN])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "Expected NOT_FOUND exit code");
    assert!(combined_output(&output).contains("Device 'missing' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logs_streams_lines_to_stdout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pubnub": { "publish_key": "pub-c-1", "subscribe_key": "sub-c-1" }
        })))
        .mount(&server)
        .await;
    mount_device(&server, "49b2a76b", None).await;

    let subscribe = "/subscribe/sub-c-1/device-49b2a76b-logs/0";
    Mock::given(method("GET"))
        .and(path(format!("{subscribe}/0")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[], "15"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{subscribe}/15")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [[{ "m": "Booting" }], [{ "m": "Ready" }]],
            "16"
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{subscribe}/16")))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let file = config_file(&format!(
        "[defaults]\napi_url = \"{uri}\"\npubnub_origin = \"{uri}\"\n",
        uri = server.uri()
    ));

    let output = resin_cmd()
        .args(["logs", "49b2a76b"])
        .env("RESIN_CONFIG", file.path())
        .env("RESIN_TOKEN", VALID_TOKEN)
        .output()
        .unwrap();

    assert_eq!(String::from_utf8_lossy(&output.stdout), "Booting\nReady\n");
    assert_eq!(output.status.code(), Some(7), "Expected CONNECTION exit code");
    assert!(String::from_utf8_lossy(&output.stderr).contains("HTTP 403"));
}
