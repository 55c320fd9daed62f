// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `campuslink watch` command implementation.
//!
//! Runs the connectivity context until SIGINT/SIGTERM, printing every state
//! change and every replayed message.

use campuslink_agent::{ConnectivityContext, install_signal_handler};
use campuslink_chat::OutboxEvent;
use campuslink_config::CampusLinkConfig;
use campuslink_core::CampusLinkError;
use campuslink_net::ConnectivitySnapshot;
use tokio::sync::broadcast::error::RecvError;

use crate::resolve_school;

fn transition_line(snapshot: &ConnectivitySnapshot) -> String {
    let target = snapshot
        .base_url
        .as_ref()
        .map(|u| format!(" -> {u}"))
        .unwrap_or_default();
    format!(
        "[{}] {}{target}",
        snapshot.last_changed.format("%H:%M:%S"),
        snapshot.badge()
    )
}

/// Run the `campuslink watch` command.
pub async fn run_watch(
    config: &CampusLinkConfig,
    school: Option<String>,
) -> Result<(), CampusLinkError> {
    let context = ConnectivityContext::init(config).await?;
    if school.is_some() || config.chat.default_school.is_some() {
        context.set_school(&resolve_school(config, school)?).await?;
    }

    let cancel = install_signal_handler();
    let mut snapshots = context.monitor().subscribe();
    let mut events = context.outbox().subscribe();
    let mut last_state = None;

    println!("watching (Ctrl+C to stop)");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if last_state != Some(snapshot.state) {
                    last_state = Some(snapshot.state);
                    println!("{}", transition_line(&snapshot));
                }
            }
            event = events.recv() => match event {
                Ok(OutboxEvent::Delivered { text, response }) => {
                    println!("  sent queued: {text}");
                    println!("  answer: {}", response.answer);
                }
                Ok(OutboxEvent::Requeued { count, .. }) => {
                    println!("  {count} message(s) still queued, will retry");
                }
                Ok(OutboxEvent::Queued { .. }) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }

    context.dispose().await;
    Ok(())
}
