// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connectivity monitoring for campuslink.
//!
//! [`HttpProbe`] checks one backend's health route, [`Classifier`] turns a
//! primary/secondary pair of probes into a [`ConnectivityState`], and
//! [`ConnectivityMonitor`] keeps that state current in the background.
//!
//! [`ConnectivityState`]: campuslink_core::ConnectivityState

pub mod classify;
pub mod monitor;
pub mod probe;

pub use classify::{Classification, Classifier, SecondaryOutcome};
pub use monitor::{ConnectivityMonitor, ConnectivitySnapshot};
pub use probe::HttpProbe;
