// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for campuslink.
//!
//! Deterministic stand-ins for the three adapter seams so the monitor and
//! outbox can be exercised without a network or a database file.
//!
//! # Components
//!
//! - [`ScriptedProbe`] - health probe with per-endpoint scripted outcomes
//! - [`ScriptedSender`] - message sender that records deliveries and fails on cue
//! - [`MemoryQueueStore`] - in-memory queue store
//! - [`backend`] - wiremock helpers for a fake campus backend

pub mod backend;
pub mod memory_store;
pub mod scripted_probe;
pub mod scripted_sender;

pub use memory_store::MemoryQueueStore;
pub use scripted_probe::ScriptedProbe;
pub use scripted_sender::{Delivery, ScriptedSender};
