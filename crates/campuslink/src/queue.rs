// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `campuslink queue` command implementation.

use campuslink_config::CampusLinkConfig;
use campuslink_core::{CampusLinkError, QueueKey, QueueStore, QueuedMessage};
use campuslink_storage::SqliteQueueStore;

use crate::resolve_school;

fn format_entry(entry: &QueuedMessage) -> String {
    format!(
        "  #{:<5} {}  {}",
        entry.id,
        entry.enqueued_at.format("%Y-%m-%d %H:%M:%S"),
        entry.text
    )
}

/// Run `campuslink queue list`.
pub async fn run_list(
    config: &CampusLinkConfig,
    school: Option<String>,
    json: bool,
) -> Result<(), CampusLinkError> {
    let key = QueueKey::for_school(&resolve_school(config, school)?);
    let store = SqliteQueueStore::open(&config.storage).await?;
    let entries = store.read(&key).await?;
    store.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
        );
    } else if entries.is_empty() {
        println!("queue {key} is empty");
    } else {
        println!("queue {key} ({} waiting)", entries.len());
        for entry in &entries {
            println!("{}", format_entry(entry));
        }
    }
    Ok(())
}

/// Run `campuslink queue clear`.
pub async fn run_clear(
    config: &CampusLinkConfig,
    school: Option<String>,
) -> Result<(), CampusLinkError> {
    let key = QueueKey::for_school(&resolve_school(config, school)?);
    let store = SqliteQueueStore::open(&config.storage).await?;
    let waiting = store.len(&key).await?;
    store.clear(&key).await?;
    store.close().await?;
    println!("cleared {waiting} message(s) from {key}");
    Ok(())
}
