// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Liveness probe trait for backend endpoints.

use async_trait::async_trait;

use crate::types::{Endpoint, ProbeResult};

/// Checks whether a single endpoint is alive.
///
/// Implementations must bound every call with their own timeout and must
/// never fail: timeouts, DNS errors, refused connections, bad statuses and
/// malformed bodies all come back as [`ProbeResult::unreachable`].
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    /// Probes `endpoint` once.
    async fn probe(&self, endpoint: &Endpoint) -> ProbeResult;
}
