// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health probe with scripted, per-role outcomes.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use campuslink_core::{Endpoint, EndpointRole, HealthProbe, ProbeResult};

#[derive(Debug, Clone)]
struct Step {
    result: ProbeResult,
    delay: Duration,
}

#[derive(Default)]
struct Script {
    once: HashMap<EndpointRole, VecDeque<Step>>,
    standing: HashMap<EndpointRole, ProbeResult>,
    calls: Vec<EndpointRole>,
}

/// A probe whose answers are set by the test.
///
/// One-shot steps queued with [`push`](Self::push) are consumed first; after
/// that the standing result from [`set`](Self::set) is returned. A role with
/// neither is unreachable. Delays use `tokio::time::sleep`, so they respect a
/// paused test clock.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result returned for `role` whenever no one-shot step is queued.
    pub async fn set(&self, role: EndpointRole, result: ProbeResult) {
        self.script.lock().await.standing.insert(role, result);
    }

    /// Queues a single answer for `role`, delivered after `delay`.
    pub async fn push(&self, role: EndpointRole, result: ProbeResult, delay: Duration) {
        self.script
            .lock()
            .await
            .once
            .entry(role)
            .or_default()
            .push_back(Step { result, delay });
    }

    /// Roles probed so far, in call order.
    pub async fn calls(&self) -> Vec<EndpointRole> {
        self.script.lock().await.calls.clone()
    }

    pub async fn call_count(&self, role: EndpointRole) -> usize {
        self.script
            .lock()
            .await
            .calls
            .iter()
            .filter(|r| **r == role)
            .count()
    }

    pub async fn reset_calls(&self) {
        self.script.lock().await.calls.clear();
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, endpoint: &Endpoint) -> ProbeResult {
        let step = {
            let mut script = self.script.lock().await;
            script.calls.push(endpoint.role);
            match script.once.get_mut(&endpoint.role).and_then(VecDeque::pop_front) {
                Some(step) => step,
                None => Step {
                    result: script
                        .standing
                        .get(&endpoint.role)
                        .cloned()
                        .unwrap_or_default(),
                    delay: Duration::ZERO,
                },
            }
        };
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(role: EndpointRole) -> Endpoint {
        Endpoint::parse(role, "https://example.edu").unwrap()
    }

    #[tokio::test]
    async fn one_shot_steps_take_priority() {
        let probe = ScriptedProbe::new();
        probe.set(EndpointRole::Primary, ProbeResult::reachable(10)).await;
        probe
            .push(EndpointRole::Primary, ProbeResult::unreachable(), Duration::ZERO)
            .await;

        let ep = endpoint(EndpointRole::Primary);
        assert!(!probe.probe(&ep).await.reachable);
        assert!(probe.probe(&ep).await.reachable);
        assert_eq!(probe.call_count(EndpointRole::Primary).await, 2);
    }

    #[tokio::test]
    async fn unscripted_role_is_unreachable() {
        let probe = ScriptedProbe::new();
        let result = probe.probe(&endpoint(EndpointRole::Secondary)).await;
        assert_eq!(result, ProbeResult::unreachable());
        assert_eq!(probe.calls().await, [EndpointRole::Secondary]);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_follows_the_tokio_clock() {
        let probe = ScriptedProbe::new();
        probe
            .push(
                EndpointRole::Primary,
                ProbeResult::reachable(5),
                Duration::from_secs(3),
            )
            .await;

        let start = tokio::time::Instant::now();
        probe.probe(&endpoint(EndpointRole::Primary)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
