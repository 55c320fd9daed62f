// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests that run the `campuslink` binary against fake backends.

use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;

use campuslink_test_utils::backend;
use tempfile::TempDir;
use wiremock::MockServer;

fn write_config(dir: &Path, primary: &str, secondary: Option<&str>, secure: bool) -> String {
    let secondary = secondary
        .map(|url| format!("secondary_url = \"{url}\"\n"))
        .unwrap_or_default();
    let db = dir.join("queue.db");
    let config = format!(
        r#"[client]
log_level = "error"

[endpoints]
primary_url = "{primary}"
{secondary}poll_interval_ms = 2000
probe_timeout_ms = 500

[host]
secure_context = {secure}

[storage]
database_path = "{}"

[chat]
default_school = "sjsu"
"#,
        db.display()
    );
    let path = dir.join("campuslink.toml");
    std::fs::write(&path, config).unwrap();
    path.to_string_lossy().into_owned()
}

async fn run(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_campuslink"))
            .args(&args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn args(config: &str, rest: &[&str]) -> Vec<String> {
    let mut all = vec!["--config".to_string(), config.to_string()];
    all.extend(rest.iter().map(|s| s.to_string()));
    all
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn status_reports_primary() {
    let dir = TempDir::new().unwrap();
    let primary = backend::healthy_backend("cloud", "hi").await;
    let config = write_config(dir.path(), &primary.uri(), None, false);

    let json = stdout_json(&run(args(&config, &["status", "--json"])).await);

    assert_eq!(json["state"], "primary-reachable");
    assert_eq!(json["can_send"], true);
    assert_eq!(json["primary"]["mode"], "cloud");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_falls_back_to_edge() {
    let dir = TempDir::new().unwrap();
    let primary = MockServer::start().await;
    backend::mount_health_status(&primary, 503).await;
    let edge = MockServer::start().await;
    backend::mount_health(&edge, "offline", Duration::from_millis(20)).await;
    let config = write_config(dir.path(), &primary.uri(), Some(&edge.uri()), false);

    let json = stdout_json(&run(args(&config, &["status", "--json"])).await);

    assert_eq!(json["state"], "secondary-reachable");
    assert_eq!(json["base_url"], format!("{}/", edge.uri()));
    assert_eq!(json["secondary"]["status"], "reachable");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_blocked_edge_is_never_contacted() {
    let dir = TempDir::new().unwrap();
    let primary = MockServer::start().await;
    backend::mount_health_status(&primary, 500).await;
    let edge = MockServer::start().await;
    backend::mount_health(&edge, "offline", Duration::ZERO).await;
    let config = write_config(dir.path(), &primary.uri(), Some(&edge.uri()), true);

    let json = stdout_json(&run(args(&config, &["status", "--json"])).await);

    assert_eq!(json["state"], "blocked");
    assert_eq!(json["badge"], "Blocked (Mixed Content)");
    assert_eq!(backend::hits(&edge, "/health").await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_list_and_clear() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:1", None, false);

    {
        use campuslink_config::model::StorageConfig;
        use campuslink_core::{QueueKey, QueueStore};
        let store = campuslink_storage::SqliteQueueStore::open(&StorageConfig {
            database_path: dir.path().join("queue.db").to_string_lossy().into_owned(),
            wal_mode: true,
        })
        .await
        .unwrap();
        let key = QueueKey::for_school("sjsu");
        store.append(&key, "Hello").await.unwrap();
        store.append(&key, "Is the gym open?").await.unwrap();
        store.close().await.unwrap();
    }

    let json = stdout_json(&run(args(&config, &["queue", "list", "--json"])).await);
    let texts: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["Hello", "Is the gym open?"]);

    let cleared = run(args(&config, &["queue", "clear"])).await;
    assert!(cleared.status.success());
    assert!(String::from_utf8_lossy(&cleared.stdout).contains("cleared 2"));

    let json = stdout_json(&run(args(&config, &["queue", "list", "--json"])).await);
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("campuslink.toml");
    std::fs::write(&path, "[endpoints]\npoll_intervall_ms = 4000\n").unwrap();

    let output = run(args(&path.to_string_lossy(), &["status"])).await;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("poll_interval_ms"));
}

#[tokio::test(flavor = "multi_thread")]
async fn config_command_prints_effective_toml() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "https://api.campus.edu", None, true);

    let output = run(args(&config, &["config"])).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("primary_url = \"https://api.campus.edu\""), "{stdout}");
    assert!(stdout.contains("secure_context = true"), "{stdout}");
    assert!(stdout.contains("health_path = \"/health\""), "{stdout}");
}
