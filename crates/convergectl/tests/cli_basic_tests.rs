use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a test command isolated from the user's config
fn convergectl() -> Command {
    let mut cmd = Command::cargo_bin("convergectl").unwrap();
    cmd.env_remove("CONVERGE_CONFIG_FILE").env_remove("RUST_LOG");
    cmd
}

/// Write a config with short delays so end-to-end runs finish quickly
fn fast_config(dir: &TempDir) -> std::path::PathBuf {
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[retry]\ntimeout_secs = 10\ndelay_ms = 10\n\n[watch]\ntimeout_secs = 10\ndelay_ms = 10\n",
    )
    .unwrap();
    config_path
}

/// Run a prepared command off the async runtime
async fn run(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

fn volume(state: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "vol-1",
        "status": {"state": state}
    }))
}

#[test]
fn test_help_flag() {
    convergectl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("eventually consistent"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    convergectl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("convergectl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_help() {
    convergectl()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    convergectl()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_config_show_reflects_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[retry]\ntimeout_secs = 42\n").unwrap();

    convergectl()
        .arg("--config-file")
        .arg(&config_path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_secs = 42"))
        .stdout(predicate::str::contains("continuous_target_occurrence = 1"));
}

#[test]
fn test_config_show_applies_retry_overrides() {
    let dir = TempDir::new().unwrap();

    convergectl()
        .arg("--config-file")
        .arg(dir.path().join("missing.toml"))
        .args(["--retry-delay-ms", "750", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("delay_ms = 750"));
}

#[test]
fn test_config_path_prints_explicit_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("custom.toml");

    convergectl()
        .arg("--config-file")
        .arg(&config_path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[watch]\ncontinuous_target_occurrence = 0\n").unwrap();

    convergectl()
        .arg("--config-file")
        .arg(&config_path)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("continuous_target_occurrence"));
}

#[test]
fn test_wait_requires_target() {
    let dir = TempDir::new().unwrap();

    convergectl()
        .arg("--config-file")
        .arg(fast_config(&dir))
        .args(["wait", "http://127.0.0.1:1/things/1", "--pending", "pending"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--target"));
}

#[tokio::test]
async fn test_wait_until_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/s1/volumes/vol-1"))
        .respond_with(volume("pending"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spaces/s1/volumes/vol-1"))
        .respond_with(volume("available"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("wait")
        .arg(format!("{}/spaces/{{space}}/volumes/{{id}}", server.uri()))
        .args(["--space", "s1", "--id", "vol-1"])
        .args(["--pending", "pending,requested", "--target", "available"])
        .args(["--status-path", "status.state"]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("\"available\""));
}

#[tokio::test]
async fn test_wait_fails_on_unexpected_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/volumes/vol-1"))
        .respond_with(volume("error"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("wait")
        .arg(format!("{}/volumes/vol-1", server.uri()))
        .args(["--pending", "pending", "--target", "available"])
        .args(["--status-path", "/status/state"]);

    run(cmd)
        .await
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unexpected state 'error'"));
}

#[tokio::test]
async fn test_create_retries_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spaces/s1/volumes"))
        .respond_with(ResponseTemplate::new(409))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/spaces/s1/volumes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "vol-1"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("create")
        .arg(format!("{}/spaces/{{space}}/volumes", server.uri()))
        .args(["--space", "s1"]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("vol-1"));
}

#[tokio::test]
async fn test_create_rejection_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/volumes"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("create")
        .arg(format!("{}/volumes", server.uri()));

    run(cmd)
        .await
        .failure()
        .code(1)
        .stderr(predicate::str::contains("400"));
}

#[tokio::test]
async fn test_delete_and_wait_until_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/spaces/s1/volumes/vol-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spaces/s1/volumes/vol-1"))
        .respond_with(volume("deleting"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spaces/s1/volumes/vol-1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("delete")
        .arg(format!("{}/spaces/{{space}}/volumes/{{id}}", server.uri()))
        .args(["--space", "s1", "--id", "vol-1", "--wait"])
        .args(["--pending", "deleting", "--status-path", "/status/state"]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("vol-1 deleted"));
}

#[tokio::test]
async fn test_create_and_wait_follows_new_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/spaces/s1/volumes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"volume_id": 42})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spaces/s1/volumes/42"))
        .respond_with(volume("pending"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/spaces/s1/volumes/42"))
        .respond_with(volume("available"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("create")
        .arg(format!("{}/spaces/{{space}}/volumes", server.uri()))
        .args(["--space", "s1", "--wait"])
        .arg("--read-url")
        .arg(format!("{}/spaces/{{space}}/volumes/{{id}}", server.uri()))
        .args(["--id-path", "volume_id"])
        .args(["--pending", "pending", "--target", "available"])
        .args(["--status-path", "status.state"]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("\"available\""));
}

#[tokio::test]
async fn test_create_wait_without_target_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut cmd = convergectl();
    cmd.arg("--config-file")
        .arg(fast_config(&dir))
        .arg("create")
        .arg(format!("{}/volumes", server.uri()))
        .arg("--wait")
        .arg("--read-url")
        .arg(format!("{}/volumes/{{id}}", server.uri()))
        .args(["--pending", "pending"]);

    run(cmd)
        .await
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--target"));
}

#[test]
fn test_zero_wait_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();

    convergectl()
        .arg("--config-file")
        .arg(fast_config(&dir))
        .args(["wait", "http://127.0.0.1:1/things/1"])
        .args(["--target", "available", "--wait-timeout", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--wait-timeout must be greater than zero"));
}
