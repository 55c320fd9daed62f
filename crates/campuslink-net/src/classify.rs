// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One classification cycle: primary first, secondary only as fallback.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use url::Url;

use campuslink_config::model::CampusLinkConfig;
use campuslink_core::{
    CampusLinkError, ConnectivityState, Endpoint, EndpointRole, HealthProbe, ProbeResult,
};

/// What happened to the secondary endpoint during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SecondaryOutcome {
    /// No secondary endpoint is configured.
    NotConfigured,
    /// The primary answered, so the secondary was not needed.
    NotAttempted,
    /// Plain-HTTP secondary refused because the host context is secure.
    Blocked,
    /// The primary failed and the secondary was probed with this result.
    Probed { result: ProbeResult },
}

/// Result of one cycle: the derived state plus the raw probe results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub state: ConnectivityState,
    pub primary: ProbeResult,
    pub secondary: SecondaryOutcome,
}

impl Classification {
    /// The classification used while the host reports no network at all.
    pub fn host_offline() -> Self {
        Self {
            state: ConnectivityState::Unreachable,
            primary: ProbeResult::unreachable(),
            secondary: SecondaryOutcome::NotAttempted,
        }
    }

    pub fn secondary_result(&self) -> Option<&ProbeResult> {
        match &self.secondary {
            SecondaryOutcome::Probed { result } => Some(result),
            _ => None,
        }
    }
}

/// Probes the configured endpoints and derives a [`ConnectivityState`].
pub struct Classifier {
    probe: Arc<dyn HealthProbe>,
    primary: Endpoint,
    secondary: Option<Endpoint>,
    secure_context: bool,
}

impl Classifier {
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        primary: Endpoint,
        secondary: Option<Endpoint>,
        secure_context: bool,
    ) -> Self {
        Self {
            probe,
            primary,
            secondary,
            secure_context,
        }
    }

    pub fn from_config(
        config: &CampusLinkConfig,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self, CampusLinkError> {
        Ok(Self::new(
            probe,
            config.endpoints.primary()?,
            config.endpoints.secondary()?,
            config.host.secure_context,
        ))
    }

    pub fn endpoint(&self, role: EndpointRole) -> Option<&Endpoint> {
        match role {
            EndpointRole::Primary => Some(&self.primary),
            EndpointRole::Secondary => self.secondary.as_ref(),
        }
    }

    /// Base URL to send to while in `state`, if any.
    pub fn base_url_for(&self, state: ConnectivityState) -> Option<Url> {
        state
            .active_role()
            .and_then(|role| self.endpoint(role))
            .map(|ep| ep.base_url.clone())
    }

    /// Runs one cycle. Never fails; the worst case is `Unreachable`.
    pub async fn classify(&self) -> Classification {
        let primary = self.probe.probe(&self.primary).await;
        if primary.reachable {
            return Classification {
                state: ConnectivityState::PrimaryReachable,
                primary,
                secondary: if self.secondary.is_some() {
                    SecondaryOutcome::NotAttempted
                } else {
                    SecondaryOutcome::NotConfigured
                },
            };
        }

        let Some(secondary) = &self.secondary else {
            return Classification {
                state: ConnectivityState::Unreachable,
                primary,
                secondary: SecondaryOutcome::NotConfigured,
            };
        };

        if self.secure_context && secondary.is_insecure() {
            debug!(
                base_url = %secondary.base_url,
                "secondary is plain http from a secure context; not probing"
            );
            return Classification {
                state: ConnectivityState::Blocked,
                primary,
                secondary: SecondaryOutcome::Blocked,
            };
        }

        let result = self.probe.probe(secondary).await;
        let state = if result.reachable {
            ConnectivityState::SecondaryReachable
        } else {
            ConnectivityState::Unreachable
        };
        Classification {
            state,
            primary,
            secondary: SecondaryOutcome::Probed { result },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campuslink_test_utils::ScriptedProbe;

    fn primary() -> Endpoint {
        Endpoint::parse(EndpointRole::Primary, "https://api.campus.edu").unwrap()
    }

    fn secondary(raw: &str) -> Endpoint {
        Endpoint::parse(EndpointRole::Secondary, raw).unwrap()
    }

    fn classifier(probe: &ScriptedProbe, secondary: Option<Endpoint>, secure: bool) -> Classifier {
        Classifier::new(Arc::new(probe.clone()), primary(), secondary, secure)
    }

    #[tokio::test]
    async fn primary_preferred_when_both_answer() {
        let probe = ScriptedProbe::new();
        probe.set(EndpointRole::Primary, ProbeResult::reachable(80)).await;
        probe.set(EndpointRole::Secondary, ProbeResult::reachable(5)).await;

        let c = classifier(&probe, Some(secondary("https://edge.local")), false);
        let result = c.classify().await;

        assert_eq!(result.state, ConnectivityState::PrimaryReachable);
        assert_eq!(result.secondary, SecondaryOutcome::NotAttempted);
        assert_eq!(probe.calls().await, [EndpointRole::Primary]);
        assert_eq!(
            c.base_url_for(result.state).unwrap().as_str(),
            "https://api.campus.edu/"
        );
    }

    #[tokio::test]
    async fn falls_back_to_secondary() {
        let probe = ScriptedProbe::new();
        probe.set(EndpointRole::Secondary, ProbeResult::reachable(12)).await;

        let c = classifier(&probe, Some(secondary("http://edge.local:8000")), false);
        let result = c.classify().await;

        assert_eq!(result.state, ConnectivityState::SecondaryReachable);
        assert_eq!(result.secondary_result().unwrap().latency_ms, Some(12));
        assert_eq!(
            c.base_url_for(result.state).unwrap().as_str(),
            "http://edge.local:8000/"
        );
    }

    #[tokio::test]
    async fn insecure_secondary_from_secure_context_is_blocked_without_probing() {
        let probe = ScriptedProbe::new();
        probe.set(EndpointRole::Secondary, ProbeResult::reachable(1)).await;

        let c = classifier(&probe, Some(secondary("http://edge.local:8000")), true);
        let result = c.classify().await;

        assert_eq!(result.state, ConnectivityState::Blocked);
        assert_eq!(result.secondary, SecondaryOutcome::Blocked);
        assert_eq!(probe.call_count(EndpointRole::Secondary).await, 0);
        assert_eq!(c.base_url_for(result.state), None);
    }

    #[tokio::test]
    async fn https_secondary_from_secure_context_is_probed() {
        let probe = ScriptedProbe::new();
        probe.set(EndpointRole::Secondary, ProbeResult::reachable(1)).await;

        let c = classifier(&probe, Some(secondary("https://edge.local")), true);
        assert_eq!(c.classify().await.state, ConnectivityState::SecondaryReachable);
    }

    #[tokio::test]
    async fn both_down_is_unreachable() {
        let probe = ScriptedProbe::new();
        let c = classifier(&probe, Some(secondary("https://edge.local")), false);
        let result = c.classify().await;

        assert_eq!(result.state, ConnectivityState::Unreachable);
        assert_eq!(
            probe.calls().await,
            [EndpointRole::Primary, EndpointRole::Secondary]
        );
    }

    #[tokio::test]
    async fn no_secondary_configured() {
        let probe = ScriptedProbe::new();
        let c = classifier(&probe, None, true);
        let result = c.classify().await;

        assert_eq!(result.state, ConnectivityState::Unreachable);
        assert_eq!(result.secondary, SecondaryOutcome::NotConfigured);
    }
}
