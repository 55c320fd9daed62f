// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent outbound queue trait.

use async_trait::async_trait;

use crate::error::CampusLinkError;
use crate::types::{QueueKey, QueuedMessage};

/// Ordered, durable storage for messages that could not be sent live.
///
/// Each [`QueueKey`] owns an independent FIFO list. Operations on one key
/// never touch another key's entries. Every method is atomic with respect
/// to the other methods on the same store.
#[async_trait]
pub trait QueueStore: Send + Sync + 'static {
    /// Appends `text` to the tail of `key`'s queue.
    async fn append(&self, key: &QueueKey, text: &str) -> Result<QueuedMessage, CampusLinkError>;

    /// Returns a snapshot of `key`'s queue in FIFO order.
    async fn read(&self, key: &QueueKey) -> Result<Vec<QueuedMessage>, CampusLinkError>;

    /// Removes every entry from `key`'s queue.
    async fn clear(&self, key: &QueueKey) -> Result<(), CampusLinkError>;

    /// Reads and clears `key`'s queue in one step.
    async fn take(&self, key: &QueueKey) -> Result<Vec<QueuedMessage>, CampusLinkError>;

    /// Puts `entries` back at the head of `key`'s queue, keeping their order
    /// and placing them before anything appended since they were taken.
    async fn requeue_front(
        &self,
        key: &QueueKey,
        entries: &[QueuedMessage],
    ) -> Result<(), CampusLinkError>;
}
