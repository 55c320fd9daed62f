// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for campuslink.
//!
//! This crate provides the error type, the shared connectivity and queue
//! types, and the trait seams ([`HealthProbe`], [`QueueStore`],
//! [`MessageSender`]) that the monitor and outbox crates are built on.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CampusLinkError;
pub use types::{
    AnswerSource, AskRequest, AskResponse, ConnectivityState, Endpoint, EndpointRole,
    ProbeResult, QueueKey, QueuedMessage,
};

pub use traits::{HealthProbe, MessageSender, QueueStore};
