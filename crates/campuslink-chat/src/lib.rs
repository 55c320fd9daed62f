// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat delivery for campuslink.
//!
//! [`AskClient`] talks to the backend's ask route; [`Outbox`] decides
//! whether a message goes out now or waits in the persisted queue.

pub mod client;
pub mod outbox;

pub use client::AskClient;
pub use outbox::{ActiveQueue, FlushReport, Outbox, OutboxEvent, SendOutcome};
