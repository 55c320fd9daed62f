// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for campuslink.

use thiserror::Error;

/// The primary error type used across campuslink traits and core operations.
///
/// Connectivity probing never produces one of these; probe failures are
/// folded into [`ProbeResult`](crate::types::ProbeResult) values instead.
#[derive(Debug, Error)]
pub enum CampusLinkError {
    /// Configuration errors (invalid TOML, bad URLs, out-of-range intervals).
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue storage errors (database open, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Message delivery failed (network error, non-success status, bad body).
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An outbound message was rejected before reaching the queue or network.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A queue operation was attempted before any queue key was set.
    #[error("no queue key set")]
    NoQueueKey,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CampusLinkError {
    /// Shorthand for a delivery error without an underlying source.
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
            source: None,
        }
    }
}
