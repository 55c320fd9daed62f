// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the monitor, the outbox, and their backends.
//!
//! All traits use `#[async_trait]` so they can be held as `Arc<dyn ...>`.

pub mod probe;
pub mod queue;
pub mod sender;

pub use probe::HealthProbe;
pub use queue::QueueStore;
pub use sender::MessageSender;
