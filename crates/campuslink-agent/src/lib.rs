// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle wiring for campuslink.
//!
//! [`ConnectivityContext`] runs the connectivity monitor and the auto-flush
//! task until disposed; [`shutdown`] ties them to process signals.

pub mod auto_flush;
pub mod context;
pub mod shutdown;

pub use context::ConnectivityContext;
pub use shutdown::install_signal_handler;
