// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered per-key queue operations.
//!
//! Rows are ordered by an explicit `position` column rather than by id so
//! that entries can be put back at the head of a key's queue. Positions may
//! go negative; only their relative order matters.

use campuslink_core::{CampusLinkError, QueuedMessage};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};

use crate::database::{map_tr_err, Database};

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<QueuedMessage, rusqlite::Error> {
    Ok(QueuedMessage {
        id: row.get(0)?,
        text: row.get(1)?,
        enqueued_at: row.get(2)?,
    })
}

fn select_all(conn: &Connection, storage_key: &str) -> Result<Vec<QueuedMessage>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, payload, enqueued_at FROM outbound_queue
         WHERE storage_key = ?1
         ORDER BY position ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![storage_key], row_to_message)?;
    rows.collect()
}

fn next_tail_position(tx: &Transaction<'_>, storage_key: &str) -> Result<i64, rusqlite::Error> {
    tx.query_row(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM outbound_queue WHERE storage_key = ?1",
        params![storage_key],
        |row| row.get(0),
    )
}

/// Append `text` at the tail of the queue stored under `storage_key`.
pub async fn append(
    db: &Database,
    storage_key: &str,
    text: &str,
) -> Result<QueuedMessage, CampusLinkError> {
    let storage_key = storage_key.to_string();
    let text = text.to_string();
    db.connection()
        .call(move |conn| -> Result<QueuedMessage, rusqlite::Error> {
            let tx = conn.transaction()?;
            let position = next_tail_position(&tx, &storage_key)?;
            let enqueued_at = Utc::now();
            tx.execute(
                "INSERT INTO outbound_queue (storage_key, position, payload, enqueued_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![storage_key, position, text, enqueued_at],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(QueuedMessage {
                id,
                text,
                enqueued_at,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Snapshot of the queue in FIFO order.
pub async fn list(db: &Database, storage_key: &str) -> Result<Vec<QueuedMessage>, CampusLinkError> {
    let storage_key = storage_key.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<QueuedMessage>, rusqlite::Error> {
            select_all(conn, &storage_key)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of entries waiting under `storage_key`.
pub async fn count(db: &Database, storage_key: &str) -> Result<usize, CampusLinkError> {
    let storage_key = storage_key.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM outbound_queue WHERE storage_key = ?1",
                params![storage_key],
                |row| row.get(0),
            )
        })
        .await
        .map(|n| usize::try_from(n).unwrap_or_default())
        .map_err(map_tr_err)
}

/// Delete every entry under `storage_key`. Returns how many were removed.
pub async fn delete_all(db: &Database, storage_key: &str) -> Result<usize, CampusLinkError> {
    let storage_key = storage_key.to_string();
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM outbound_queue WHERE storage_key = ?1",
                params![storage_key],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Read and delete the whole queue in one transaction.
pub async fn drain(db: &Database, storage_key: &str) -> Result<Vec<QueuedMessage>, CampusLinkError> {
    let storage_key = storage_key.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<QueuedMessage>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let entries = select_all(&tx, &storage_key)?;
            tx.execute(
                "DELETE FROM outbound_queue WHERE storage_key = ?1",
                params![storage_key],
            )?;
            tx.commit()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert `entries` ahead of everything currently queued, keeping their
/// ids, timestamps, and relative order.
pub async fn prepend(
    db: &Database,
    storage_key: &str,
    entries: &[QueuedMessage],
) -> Result<(), CampusLinkError> {
    if entries.is_empty() {
        return Ok(());
    }
    let storage_key = storage_key.to_string();
    let entries: Vec<(i64, String, DateTime<Utc>)> = entries
        .iter()
        .map(|e| (e.id, e.text.clone(), e.enqueued_at))
        .collect();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            let head: i64 = tx.query_row(
                "SELECT COALESCE(MIN(position), 1) FROM outbound_queue WHERE storage_key = ?1",
                params![storage_key],
                |row| row.get(0),
            )?;
            let first = head - entries.len() as i64;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR REPLACE INTO outbound_queue
                         (id, storage_key, position, payload, enqueued_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (offset, (id, text, enqueued_at)) in entries.iter().enumerate() {
                    stmt.execute(params![
                        id,
                        storage_key,
                        first + offset as i64,
                        text,
                        enqueued_at
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("queue.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn texts(entries: &[QueuedMessage]) -> Vec<&str> {
        entries.iter().map(|e| e.text.as_str()).collect()
    }

    #[tokio::test]
    async fn append_preserves_fifo_order() {
        let (db, _dir) = setup_db().await;

        for text in ["first", "second", "third"] {
            append(&db, "queue:chat:sjsu", text).await.unwrap();
        }

        let entries = list(&db, "queue:chat:sjsu").await.unwrap();
        assert_eq!(texts(&entries), ["first", "second", "third"]);
        assert_eq!(count(&db, "queue:chat:sjsu").await.unwrap(), 3);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let (db, _dir) = setup_db().await;

        append(&db, "queue:chat:sjsu", "a").await.unwrap();
        append(&db, "queue:chat:deanza", "b").await.unwrap();
        delete_all(&db, "queue:chat:sjsu").await.unwrap();

        assert!(list(&db, "queue:chat:sjsu").await.unwrap().is_empty());
        assert_eq!(texts(&list(&db, "queue:chat:deanza").await.unwrap()), ["b"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn drain_empties_and_returns_everything() {
        let (db, _dir) = setup_db().await;

        append(&db, "k", "one").await.unwrap();
        append(&db, "k", "two").await.unwrap();

        let drained = drain(&db, "k").await.unwrap();
        assert_eq!(texts(&drained), ["one", "two"]);
        assert!(list(&db, "k").await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn prepend_goes_before_newer_appends() {
        let (db, _dir) = setup_db().await;

        append(&db, "k", "one").await.unwrap();
        append(&db, "k", "two").await.unwrap();
        let drained = drain(&db, "k").await.unwrap();

        // A new message arrives while the drained batch is in flight.
        append(&db, "k", "three").await.unwrap();
        prepend(&db, "k", &drained).await.unwrap();

        let entries = list(&db, "k").await.unwrap();
        assert_eq!(texts(&entries), ["one", "two", "three"]);
        assert_eq!(entries[0].id, drained[0].id);
        assert_eq!(entries[0].enqueued_at, drained[0].enqueued_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn prepend_into_empty_queue() {
        let (db, _dir) = setup_db().await;

        append(&db, "k", "x").await.unwrap();
        let drained = drain(&db, "k").await.unwrap();
        prepend(&db, "k", &drained).await.unwrap();
        prepend(&db, "k", &[]).await.unwrap();

        assert_eq!(texts(&list(&db, "k").await.unwrap()), ["x"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("queue.db");
        let path = path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        append(&db, "queue:chat:sjsu", "Hello").await.unwrap();
        db.close().await.unwrap();

        let db = Database::open(path).await.unwrap();
        assert_eq!(texts(&list(&db, "queue:chat:sjsu").await.unwrap()), ["Hello"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_appends_all_land() {
        let (db, _dir) = setup_db().await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                append(&db, "k", &format!("m{i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let entries = list(&db, "k").await.unwrap();
        assert_eq!(entries.len(), 10);

        let positions: Vec<i64> = db
            .connection()
            .call(|conn| -> Result<Vec<i64>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT position FROM outbound_queue WHERE storage_key = 'k'
                     ORDER BY position ASC, id ASC",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert!(
            positions.windows(2).all(|pair| pair[0] < pair[1]),
            "positions must be strictly increasing: {positions:?}"
        );

        db.close().await.unwrap();
    }
}
