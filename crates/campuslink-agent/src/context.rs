// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ConnectivityContext`]: the monitor and the outbox wired together,
//! with an explicit `init`/`dispose` lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use campuslink_chat::{AskClient, Outbox, SendOutcome};
use campuslink_config::model::CampusLinkConfig;
use campuslink_core::CampusLinkError;
use campuslink_net::{ConnectivityMonitor, ConnectivitySnapshot, HttpProbe};
use campuslink_storage::SqliteQueueStore;

use crate::auto_flush::run_auto_flush;
use crate::shutdown::drain_tasks;

/// How long `dispose` waits for the background tasks to stop. A cancelled
/// flush only has to requeue its remainder, which is a single write.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the background monitor loop and the auto-flush task.
pub struct ConnectivityContext {
    monitor: Arc<ConnectivityMonitor>,
    outbox: Arc<Outbox>,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    storage: Option<SqliteQueueStore>,
}

impl ConnectivityContext {
    /// Builds everything from configuration and starts polling.
    ///
    /// Opens the queue database, probes over HTTP, delivers with
    /// [`AskClient`], and selects `chat.default_school` as the active queue
    /// when one is configured.
    pub async fn init(config: &CampusLinkConfig) -> Result<Self, CampusLinkError> {
        let probe = Arc::new(HttpProbe::from_config(&config.endpoints)?);
        let monitor = Arc::new(ConnectivityMonitor::from_config(config, probe)?);

        let store = SqliteQueueStore::open(&config.storage).await?;
        let sender = Arc::new(AskClient::from_config(&config.chat)?);
        let outbox = Arc::new(Outbox::new(Arc::new(store.clone()), sender));
        if let Some(school) = config.chat.default_school.as_deref() {
            outbox.set_queue_key(school).await?;
        }

        info!(
            client = %config.client.name,
            primary = %config.endpoints.primary_url,
            "connectivity context starting"
        );
        let mut context = Self::start(monitor, outbox, CancellationToken::new());
        context.storage = Some(store);
        Ok(context)
    }

    /// Starts the background tasks over pre-built parts. Cancelling
    /// `cancel` stops them, as does [`dispose`](Self::dispose).
    pub fn start(
        monitor: Arc<ConnectivityMonitor>,
        outbox: Arc<Outbox>,
        cancel: CancellationToken,
    ) -> Self {
        let mut tasks = JoinSet::new();
        tasks.spawn(Arc::clone(&monitor).run(cancel.clone()));
        tasks.spawn(run_auto_flush(
            Arc::clone(&monitor),
            Arc::clone(&outbox),
            cancel.clone(),
        ));
        Self {
            monitor,
            outbox,
            cancel,
            tasks,
            storage: None,
        }
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    pub fn outbox(&self) -> &Arc<Outbox> {
        &self.outbox
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.monitor.snapshot()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn set_school(&self, school: &str) -> Result<(), CampusLinkError> {
        self.outbox.set_queue_key(school).await
    }

    /// Forwards the host's online/offline notification to the monitor.
    pub fn host_online(&self, online: bool) {
        self.monitor.notify_host_online(online);
    }

    /// Sends now through the current endpoint, or queues when none is usable.
    pub async fn send(&self, text: &str) -> Result<SendOutcome, CampusLinkError> {
        let base_url = self.monitor.current_base_url();
        self.outbox.send(text, base_url.as_ref()).await
    }

    /// Stops polling, lets a running flush finish, and closes the database.
    pub async fn dispose(self) {
        self.cancel.cancel();
        drain_tasks(self.tasks, DRAIN_TIMEOUT).await;
        drop(self.outbox);
        if let Some(store) = self.storage {
            if let Err(e) = store.close().await {
                warn!(error = %e, "failed to close queue database cleanly");
            }
        }
        info!("connectivity context disposed");
    }
}
