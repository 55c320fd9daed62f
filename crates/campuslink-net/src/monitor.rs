// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Continuous connectivity monitoring.
//!
//! [`ConnectivityMonitor`] classifies once at start and then on a fixed
//! interval, publishing a [`ConnectivitySnapshot`] on a `watch` channel.
//! Each classification is tagged with a generation number when it starts;
//! a result is published only if no later classification has started in
//! the meantime, so a slow cycle can never overwrite a fresher one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use campuslink_config::model::CampusLinkConfig;
use campuslink_core::{CampusLinkError, ConnectivityState, HealthProbe};

use crate::classify::{Classification, Classifier};

/// Published view of the monitor's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivitySnapshot {
    pub state: ConnectivityState,
    pub primary_latency_ms: Option<u64>,
    pub secondary_latency_ms: Option<u64>,
    /// Mode the primary reported in its acknowledgement, if any.
    pub backend_mode: Option<String>,
    /// Where sends go right now; `None` unless sendable.
    pub base_url: Option<Url>,
    pub host_online: bool,
    /// When `state` last changed. Display only.
    pub last_changed: DateTime<Utc>,
}

impl ConnectivitySnapshot {
    fn initial() -> Self {
        Self {
            state: ConnectivityState::Unreachable,
            primary_latency_ms: None,
            secondary_latency_ms: None,
            backend_mode: None,
            base_url: None,
            host_online: true,
            last_changed: Utc::now(),
        }
    }

    pub fn can_send(&self) -> bool {
        self.state.can_send()
    }

    /// Latency of the endpoint currently in use.
    pub fn active_latency_ms(&self) -> Option<u64> {
        match self.state {
            ConnectivityState::PrimaryReachable => self.primary_latency_ms,
            ConnectivityState::SecondaryReachable => self.secondary_latency_ms,
            ConnectivityState::Unreachable | ConnectivityState::Blocked => None,
        }
    }

    /// Status badge text, e.g. `Online · Cloud 42ms` or `Offline (Queue)`.
    pub fn badge(&self) -> String {
        self.state.badge(self.active_latency_ms())
    }
}

/// Background classifier with a "can send now" signal.
pub struct ConnectivityMonitor {
    classifier: Classifier,
    poll_interval: Duration,
    snapshot: watch::Sender<ConnectivitySnapshot>,
    started: AtomicU64,
    host_online: AtomicBool,
    wake: Notify,
}

impl ConnectivityMonitor {
    pub fn new(classifier: Classifier, poll_interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(ConnectivitySnapshot::initial());
        Self {
            classifier,
            poll_interval,
            snapshot,
            started: AtomicU64::new(0),
            host_online: AtomicBool::new(true),
            wake: Notify::new(),
        }
    }

    pub fn from_config(
        config: &CampusLinkConfig,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self, CampusLinkError> {
        Ok(Self::new(
            Classifier::from_config(config, probe)?,
            config.endpoints.poll_interval(),
        ))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Receiver that wakes on every published change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivitySnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> ConnectivityState {
        self.snapshot.borrow().state
    }

    /// True iff the primary or the secondary endpoint is reachable.
    pub fn can_send(&self) -> bool {
        self.snapshot.borrow().can_send()
    }

    pub fn current_base_url(&self) -> Option<Url> {
        self.snapshot.borrow().base_url.clone()
    }

    /// Runs one classification now. Returns `false` if the result was
    /// discarded because a newer classification started meanwhile.
    pub async fn tick(&self) -> bool {
        let generation = self.begin();
        let classification = if self.host_online.load(Ordering::SeqCst) {
            self.classifier.classify().await
        } else {
            Classification::host_offline()
        };
        self.apply(generation, &classification)
    }

    /// Records the host's own view of its network.
    ///
    /// Going offline publishes `Unreachable` at once without probing. Coming
    /// back online wakes [`run`](Self::run) for an immediate classification.
    pub fn notify_host_online(&self, online: bool) {
        let was_online = self.host_online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return;
        }
        if online {
            info!("host network back online");
            self.wake.notify_one();
        } else {
            info!("host network offline");
            let generation = self.begin();
            self.apply(generation, &Classification::host_offline());
        }
    }

    /// Polls until `cancel` fires. The first classification runs immediately.
    ///
    /// Every cycle runs in its own task, so a slow probe never delays the
    /// next tick. In-flight cycles are aborted on cancellation.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "connectivity monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.wake.notified() => {
                    debug!("classifying after host came back online");
                    interval.reset();
                }
                _ = interval.tick() => {}
            }

            while in_flight.try_join_next().is_some() {}

            let monitor = Arc::clone(&self);
            in_flight.spawn(async move {
                monitor.tick().await;
            });
        }

        in_flight.abort_all();
        info!("connectivity monitor stopped");
    }

    fn begin(&self) -> u64 {
        self.started.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(&self, generation: u64, classification: &Classification) -> bool {
        let mut published = false;
        self.snapshot.send_if_modified(|current| {
            // The watch lock serializes publishers, so this check and the
            // write below cannot interleave with another apply.
            if generation != self.started.load(Ordering::SeqCst) {
                debug!(generation, "discarding superseded classification");
                return false;
            }
            published = true;

            let next = self.next_snapshot(current, classification);
            if next.state != current.state {
                info!(
                    from = %current.state,
                    to = %next.state,
                    base_url = next.base_url.as_ref().map(Url::as_str).unwrap_or("-"),
                    "connectivity changed"
                );
            }
            let changed = next != *current;
            *current = next;
            changed
        });
        published
    }

    fn next_snapshot(
        &self,
        current: &ConnectivitySnapshot,
        classification: &Classification,
    ) -> ConnectivitySnapshot {
        let state = classification.state;
        ConnectivitySnapshot {
            state,
            primary_latency_ms: classification.primary.latency_ms,
            secondary_latency_ms: classification
                .secondary_result()
                .and_then(|r| r.latency_ms),
            backend_mode: classification.primary.mode.clone(),
            base_url: self.classifier.base_url_for(state),
            host_online: self.host_online.load(Ordering::SeqCst),
            last_changed: if state == current.state {
                current.last_changed
            } else {
                Utc::now()
            },
        }
    }
}
