// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the campuslink outbound queue.
//!
//! Provides a WAL-mode database with embedded migrations, a single-writer
//! connection via `tokio-rusqlite`, and [`SqliteQueueStore`], the durable
//! [`QueueStore`](campuslink_core::QueueStore) used by the outbox.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteQueueStore;
pub use database::Database;
