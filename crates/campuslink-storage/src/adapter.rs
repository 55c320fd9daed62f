// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`QueueStore`] trait.

use async_trait::async_trait;
use tracing::debug;

use campuslink_config::model::StorageConfig;
use campuslink_core::{CampusLinkError, QueueKey, QueueStore, QueuedMessage};

use crate::database::Database;
use crate::queries::queue;

/// Durable outbound queue backed by one SQLite file.
///
/// Cloning is cheap; all clones share the same single-writer connection.
#[derive(Clone)]
pub struct SqliteQueueStore {
    db: Database,
}

impl SqliteQueueStore {
    /// Opens the database described by `config`, creating it if needed.
    pub async fn open(config: &StorageConfig) -> Result<Self, CampusLinkError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        Ok(Self { db })
    }

    /// Wraps an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Number of entries waiting under `key`.
    pub async fn len(&self, key: &QueueKey) -> Result<usize, CampusLinkError> {
        queue::count(&self.db, &key.storage_key()).await
    }

    /// Checkpoints and closes the underlying database.
    pub async fn close(self) -> Result<(), CampusLinkError> {
        self.db.close().await
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn append(&self, key: &QueueKey, text: &str) -> Result<QueuedMessage, CampusLinkError> {
        let entry = queue::append(&self.db, &key.storage_key(), text).await?;
        debug!(key = %key, id = entry.id, "message queued");
        Ok(entry)
    }

    async fn read(&self, key: &QueueKey) -> Result<Vec<QueuedMessage>, CampusLinkError> {
        queue::list(&self.db, &key.storage_key()).await
    }

    async fn clear(&self, key: &QueueKey) -> Result<(), CampusLinkError> {
        let removed = queue::delete_all(&self.db, &key.storage_key()).await?;
        debug!(key = %key, removed, "queue cleared");
        Ok(())
    }

    async fn take(&self, key: &QueueKey) -> Result<Vec<QueuedMessage>, CampusLinkError> {
        queue::drain(&self.db, &key.storage_key()).await
    }

    async fn requeue_front(
        &self,
        key: &QueueKey,
        entries: &[QueuedMessage],
    ) -> Result<(), CampusLinkError> {
        queue::prepend(&self.db, &key.storage_key(), entries).await?;
        debug!(key = %key, count = entries.len(), "entries requeued at head");
        Ok(())
    }
}
