//! Integration tests for CLI commands

#![allow(deprecated)]

use assert_cmd::{assert::OutputAssertExt, cargo::CommandCargoExt};
use axum::routing::get;
use axum::{Json, Router};
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Config file pointing at `base_url`, so no user config is read
fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[api]\nbase_url = \"{}\"\ntimeout_secs = 2\n\n[dashboard]\nexport_dir = \"{}\"\n",
            base_url,
            dir.join("exports").display()
        ),
    )
    .unwrap();
    path
}

fn reqdash(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reqdash").unwrap();
    cmd.arg("--config")
        .arg(config)
        .env_remove("REQDASH_API_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

async fn spawn_upstream() -> String {
    let app = Router::new().route(
        "/api/v1/requests",
        get(|| async {
            Json(json!({
                "items": [{
                    "id": 1,
                    "request_id": "req-1",
                    "originated_at": "2025-09-25T10:15:00",
                    "model": "gpt-4o",
                    "duration_seconds": 0.9,
                    "input_tokens": 10,
                    "output_tokens": 2,
                    "cost_usd": 0.001,
                    "status": "success",
                    "created_at": "2025-09-25T10:15:00"
                }],
                "total": 1,
                "limit": 100,
                "offset": 0,
                "aggregates": {
                    "total_requests": 1,
                    "total_cost_usd": 0.001,
                    "total_input_tokens": 10,
                    "total_output_tokens": 2,
                    "average_latency": 0.9
                }
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("reqdash").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("dash"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("export"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("reqdash").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_status_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "http://127.0.0.1:9/api/v1");

    reqdash(&config)
        .args(["stats", "--status", "pending"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status 'pending'"));
}

#[test]
fn test_missing_config_file_fails() {
    let tmp = TempDir::new().unwrap();

    reqdash(&tmp.path().join("missing.toml"))
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_stats_against_unreachable_api_fails() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "http://127.0.0.1:9/api/v1");

    reqdash(&config)
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch analytics"));
}

#[test]
fn test_export_against_unreachable_api_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "http://127.0.0.1:9/api/v1");

    reqdash(&config)
        .args(["export", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to export analytics_summary"));
    assert!(!tmp.path().join("exports").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stats_json_output() {
    let base_url = spawn_upstream().await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), &base_url);

    let output = tokio::task::spawn_blocking(move || {
        reqdash(&config)
            .args(["stats", "--format", "json", "--days", "7"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["aggregates"]["total_requests"], 1);
    assert_eq!(value["by_model"][0]["name"], "gpt-4o");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_requests_to_out_dir() {
    let base_url = spawn_upstream().await;
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), &base_url);
    let out_dir = tmp.path().join("csv");

    let out = out_dir.clone();
    let output = tokio::task::spawn_blocking(move || {
        reqdash(&config)
            .args(["export", "requests", "--model", "gpt-4o", "--out-dir"])
            .arg(&out)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));
    let files: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
    assert_eq!(files.len(), 1);
}
