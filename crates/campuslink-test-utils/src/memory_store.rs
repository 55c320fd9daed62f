// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`QueueStore`] for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use campuslink_core::{CampusLinkError, QueueKey, QueueStore, QueuedMessage};

#[derive(Default)]
struct Inner {
    next_id: i64,
    /// Number of upcoming `requeue_front` calls that should fail.
    requeue_failures: usize,
    queues: HashMap<QueueKey, VecDeque<QueuedMessage>>,
}

/// Queue store that lives only as long as the value.
#[derive(Clone, Default)]
pub struct MemoryQueueStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `requeue_front` fail with a storage
    /// error without touching the queue.
    pub async fn fail_requeues(&self, count: usize) {
        self.inner.lock().await.requeue_failures = count;
    }

    /// Queue contents as plain texts, for assertions.
    pub async fn texts(&self, key: &QueueKey) -> Vec<String> {
        self.inner
            .lock()
            .await
            .queues
            .get(key)
            .map(|q| q.iter().map(|e| e.text.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn append(&self, key: &QueueKey, text: &str) -> Result<QueuedMessage, CampusLinkError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let entry = QueuedMessage {
            id: inner.next_id,
            text: text.to_string(),
            enqueued_at: Utc::now(),
        };
        inner
            .queues
            .entry(key.clone())
            .or_default()
            .push_back(entry.clone());
        Ok(entry)
    }

    async fn read(&self, key: &QueueKey) -> Result<Vec<QueuedMessage>, CampusLinkError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .queues
            .get(key)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, key: &QueueKey) -> Result<(), CampusLinkError> {
        self.inner.lock().await.queues.remove(key);
        Ok(())
    }

    async fn take(&self, key: &QueueKey) -> Result<Vec<QueuedMessage>, CampusLinkError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .queues
            .remove(key)
            .map(Vec::from)
            .unwrap_or_default())
    }

    async fn requeue_front(
        &self,
        key: &QueueKey,
        entries: &[QueuedMessage],
    ) -> Result<(), CampusLinkError> {
        let mut inner = self.inner.lock().await;
        if inner.requeue_failures > 0 {
            inner.requeue_failures -= 1;
            return Err(CampusLinkError::Storage {
                source: Box::new(std::io::Error::other("disk full")),
            });
        }
        let queue = inner.queues.entry(key.clone()).or_default();
        for entry in entries.iter().rev() {
            queue.push_front(entry.clone());
        }
        Ok(())
    }
}
