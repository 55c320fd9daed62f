// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replays the outbox when connectivity comes back.
//!
//! A flush starts when the monitor's "can send" signal rises from false to
//! true. While sendable, a non-empty queue is also retried once per poll
//! interval, which picks up entries left behind by a failed flush or
//! queued while another flush was running.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use campuslink_chat::Outbox;
use campuslink_core::CampusLinkError;
use campuslink_net::ConnectivityMonitor;

pub async fn run_auto_flush(
    monitor: Arc<ConnectivityMonitor>,
    outbox: Arc<Outbox>,
    cancel: CancellationToken,
) {
    let mut snapshots = monitor.subscribe();
    let mut was_sendable = snapshots.borrow_and_update().can_send();
    let mut retry = tokio::time::interval(monitor.poll_interval());
    retry.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing to retry yet.
    retry.tick().await;

    loop {
        let trigger = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let sendable = snapshots.borrow_and_update().can_send();
                let rising = sendable && !was_sendable;
                was_sendable = sendable;
                if !rising {
                    continue;
                }
                "connectivity restored"
            }
            _ = retry.tick() => {
                if !monitor.can_send() || !has_backlog(&outbox).await {
                    continue;
                }
                "retry backlog"
            }
        };

        let Some(base_url) = monitor.current_base_url() else {
            continue;
        };

        match outbox.flush_until(&base_url, &cancel).await {
            Ok(report) if report.skipped => debug!(trigger, "flush already running"),
            Ok(report) if report.interrupted => info!(
                trigger,
                delivered = report.delivered,
                requeued = report.requeued,
                "auto-flush interrupted by shutdown"
            ),
            Ok(report) if report.delivered + report.requeued > 0 => info!(
                trigger,
                delivered = report.delivered,
                requeued = report.requeued,
                "auto-flush finished"
            ),
            Ok(_) => {}
            Err(CampusLinkError::NoQueueKey) => debug!(trigger, "no active queue to flush"),
            Err(e) => warn!(trigger, error = %e, "auto-flush failed"),
        }
    }

    debug!("auto-flush stopped");
}

async fn has_backlog(outbox: &Outbox) -> bool {
    outbox
        .entries()
        .await
        .map(|entries| !entries.is_empty())
        .unwrap_or(false)
}
