// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline outbox: the send queue and its flush protocol.
//!
//! Messages typed while no backend is reachable are persisted under the
//! active queue key and replayed in order once a base URL is available.
//! A flush takes the whole queue up front; when a delivery fails, the
//! failing entry and everything after it go back to the head of the queue
//! so nothing is lost and order is kept.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use campuslink_core::{
    AskResponse, CampusLinkError, MessageSender, QueueKey, QueueStore, QueuedMessage,
};

const EVENT_CAPACITY: usize = 64;

/// Notifications for whoever renders the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboxEvent {
    /// A message was stored for later; "queued, will send when connection returns".
    Queued { key: QueueKey, entry: QueuedMessage },
    /// A queued message reached the backend during a flush.
    Delivered { text: String, response: AskResponse },
    /// A flush stopped early and put `count` entries back at the head.
    Requeued { key: QueueKey, count: usize },
}

/// What [`Outbox::send`] did with a message.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Delivered(AskResponse),
    Queued(QueuedMessage),
}

/// Counts from one flush attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub requeued: usize,
    /// Another flush was already running; nothing was done.
    pub skipped: bool,
    /// The flush was cancelled before the batch was fully delivered.
    pub interrupted: bool,
}

impl FlushReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// True when the queue was fully drained by this flush.
    pub fn completed(&self) -> bool {
        !self.skipped && self.requeued == 0
    }
}

/// The queue currently in use and the school it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQueue {
    pub school: String,
    pub key: QueueKey,
}

struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Send queue over a [`QueueStore`] and a [`MessageSender`].
pub struct Outbox {
    store: Arc<dyn QueueStore>,
    sender: Arc<dyn MessageSender>,
    active: RwLock<Option<ActiveQueue>>,
    flushing: AtomicBool,
    events: broadcast::Sender<OutboxEvent>,
}

impl Outbox {
    pub fn new(store: Arc<dyn QueueStore>, sender: Arc<dyn MessageSender>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            sender,
            active: RwLock::new(None),
            flushing: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboxEvent> {
        self.events.subscribe()
    }

    /// Switches to the queue for `school` (`chat:{school}`). Other queues
    /// are left exactly as they are.
    pub async fn set_queue_key(&self, school: &str) -> Result<(), CampusLinkError> {
        let school = school.trim();
        if school.is_empty() {
            return Err(CampusLinkError::InvalidMessage(
                "school must not be empty".to_string(),
            ));
        }
        let key = QueueKey::for_school(school);
        debug!(key = %key, "active queue switched");
        *self.active.write().await = Some(ActiveQueue {
            school: school.to_string(),
            key,
        });
        Ok(())
    }

    pub async fn active_queue(&self) -> Option<ActiveQueue> {
        self.active.read().await.clone()
    }

    async fn require_active(&self) -> Result<ActiveQueue, CampusLinkError> {
        self.active_queue().await.ok_or(CampusLinkError::NoQueueKey)
    }

    /// Persists `text` at the tail of the active queue.
    pub async fn enqueue(&self, text: &str) -> Result<QueuedMessage, CampusLinkError> {
        let text = non_empty(text)?;
        let active = self.require_active().await?;
        let entry = self.store.append(&active.key, text).await?;
        info!(key = %active.key, id = entry.id, "message queued until a backend is reachable");
        let _ = self.events.send(OutboxEvent::Queued {
            key: active.key,
            entry: entry.clone(),
        });
        Ok(entry)
    }

    /// Snapshot of the active queue's texts in send order.
    pub async fn read_queue(&self) -> Result<Vec<String>, CampusLinkError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|entry| entry.text)
            .collect())
    }

    /// Snapshot of the active queue with ids and timestamps.
    pub async fn entries(&self) -> Result<Vec<QueuedMessage>, CampusLinkError> {
        let active = self.require_active().await?;
        self.store.read(&active.key).await
    }

    pub async fn clear_queue(&self) -> Result<(), CampusLinkError> {
        let active = self.require_active().await?;
        self.store.clear(&active.key).await
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::SeqCst)
    }

    fn try_begin_flush(&self) -> Option<FlushGuard<'_>> {
        self.flushing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| FlushGuard(&self.flushing))
    }

    /// Replays the active queue against `base_url`.
    ///
    /// Single-flight: a call made while another flush runs returns a
    /// skipped report at once. Delivery failures are not errors; they end
    /// the flush with the untried entries requeued. Only storage failures
    /// are returned as `Err`.
    pub async fn flush(&self, base_url: &Url) -> Result<FlushReport, CampusLinkError> {
        self.flush_until(base_url, &CancellationToken::new()).await
    }

    /// Like [`flush`](Self::flush), but stops when `cancel` fires.
    ///
    /// A delivery in progress at cancellation is abandoned and the entry it
    /// carried is requeued with everything after it, so stopping never
    /// loses messages taken off the queue.
    pub async fn flush_until(
        &self,
        base_url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FlushReport, CampusLinkError> {
        let Some(_guard) = self.try_begin_flush() else {
            debug!("flush already in progress");
            return Ok(FlushReport::skipped());
        };
        if cancel.is_cancelled() {
            return Ok(FlushReport::default());
        }

        let active = self.require_active().await?;
        let batch = self.store.take(&active.key).await?;
        if batch.is_empty() {
            return Ok(FlushReport::default());
        }

        info!(key = %active.key, count = batch.len(), base_url = %base_url, "flushing queued messages");
        let mut report = FlushReport::default();

        for (index, entry) in batch.iter().enumerate() {
            let delivery = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.sender.deliver(base_url, &active.school, &entry.text) => Some(result),
            };

            let reason = match delivery {
                Some(Ok(response)) => {
                    report.delivered += 1;
                    let _ = self.events.send(OutboxEvent::Delivered {
                        text: entry.text.clone(),
                        response,
                    });
                    continue;
                }
                Some(Err(err)) => err.to_string(),
                None => {
                    report.interrupted = true;
                    "flush cancelled".to_string()
                }
            };

            let remainder = &batch[index..];
            warn!(
                key = %active.key,
                id = entry.id,
                requeued = remainder.len(),
                reason = %reason,
                "flush stopped early; will retry"
            );
            self.restore(&active.key, remainder).await?;
            report.requeued = remainder.len();
            let _ = self.events.send(OutboxEvent::Requeued {
                key: active.key.clone(),
                count: remainder.len(),
            });
            return Ok(report);
        }

        info!(key = %active.key, delivered = report.delivered, "queue flushed");
        Ok(report)
    }

    /// Puts `entries` back at the head of `key`, retrying once. If both
    /// attempts fail the texts are logged at error level before the storage
    /// error is returned, since they exist nowhere else.
    async fn restore(
        &self,
        key: &QueueKey,
        entries: &[QueuedMessage],
    ) -> Result<(), CampusLinkError> {
        let Err(first) = self.store.requeue_front(key, entries).await else {
            return Ok(());
        };
        warn!(key = %key, error = %first, "requeue failed; retrying once");

        match self.store.requeue_front(key, entries).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let lost: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
                error!(key = %key, error = %err, lost = ?lost, "could not requeue messages; they were dropped");
                Err(err)
            }
        }
    }

    /// Sends `text` now if `base_url` is known, otherwise queues it.
    ///
    /// Anything already queued is flushed first. If that flush cannot
    /// finish, `text` is queued behind the leftovers instead of jumping
    /// ahead of them. A failed direct delivery is returned as an error and
    /// the text is not queued.
    pub async fn send(
        &self,
        text: &str,
        base_url: Option<&Url>,
    ) -> Result<SendOutcome, CampusLinkError> {
        let text = non_empty(text)?;
        let active = self.require_active().await?;

        let Some(base_url) = base_url else {
            return self.enqueue(text).await.map(SendOutcome::Queued);
        };

        let report = self.flush(base_url).await?;
        if !report.completed() {
            return self.enqueue(text).await.map(SendOutcome::Queued);
        }

        let response = self.sender.deliver(base_url, &active.school, text).await?;
        Ok(SendOutcome::Delivered(response))
    }
}

fn non_empty(text: &str) -> Result<&str, CampusLinkError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CampusLinkError::InvalidMessage(
            "message text must not be empty".to_string(),
        ));
    }
    Ok(text)
}
