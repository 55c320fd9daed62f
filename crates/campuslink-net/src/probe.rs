// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP health probe.
//!
//! Issues `GET {base}{health_path}` bounded by a timeout. Any failure
//! (connect error, timeout, non-2xx status, missing acknowledgement) is
//! reported as an unreachable [`ProbeResult`] and logged at debug level.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

use campuslink_config::model::EndpointsConfig;
use campuslink_core::{CampusLinkError, Endpoint, HealthProbe, ProbeResult};

/// Query parameter added to defeat intermediary caches.
const CACHE_BUST_PARAM: &str = "_ts";

/// Body of the backend's `/health` route.
#[derive(Debug, Deserialize)]
struct HealthAck {
    #[serde(default)]
    ok: serde_json::Value,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum ProbeFailure {
    #[error("bad health url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("unreadable acknowledgement: {0}")]
    Body(#[source] reqwest::Error),
    #[error("backend did not acknowledge")]
    NotAcknowledged,
    #[error("no answer within {0:?}")]
    TimedOut(Duration),
}

/// [`HealthProbe`] over reqwest.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    health_path: String,
    timeout: Duration,
    require_ack: bool,
    cache_bust: bool,
}

impl HttpProbe {
    /// Builds a probe for `health_path` with the given per-call timeout.
    pub fn new(health_path: impl Into<String>, timeout: Duration) -> Result<Self, CampusLinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CampusLinkError::Internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            health_path: health_path.into(),
            timeout,
            require_ack: false,
            cache_bust: true,
        })
    }

    pub fn from_config(config: &EndpointsConfig) -> Result<Self, CampusLinkError> {
        Ok(Self::new(config.health_path.clone(), config.probe_timeout())?
            .require_ack(config.require_ack)
            .cache_bust(config.cache_bust))
    }

    /// Only count a probe as reachable when the body carries a truthy `ok`.
    pub fn require_ack(mut self, require: bool) -> Self {
        self.require_ack = require;
        self
    }

    /// Append a `_ts=<millis>` query parameter to every probe.
    pub fn cache_bust(mut self, enabled: bool) -> Self {
        self.cache_bust = enabled;
        self
    }

    fn health_url(&self, endpoint: &Endpoint) -> Result<Url, url::ParseError> {
        let mut url = endpoint.url_for(&self.health_path)?;
        if self.cache_bust {
            let stamp = chrono::Utc::now().timestamp_millis().to_string();
            url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &stamp);
        }
        Ok(url)
    }

    async fn check(&self, endpoint: &Endpoint) -> Result<ProbeResult, ProbeFailure> {
        let url = self.health_url(endpoint)?;
        let started = Instant::now();

        let response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(ProbeFailure::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Status(status));
        }

        // The body is read even when no ack is required so the reported
        // latency covers the full exchange and the mode can be recorded.
        let ack = if self.require_ack {
            let ack: HealthAck = response.json().await.map_err(ProbeFailure::Body)?;
            if !is_truthy(&ack.ok) {
                return Err(ProbeFailure::NotAcknowledged);
            }
            Some(ack)
        } else {
            response.json::<HealthAck>().await.ok()
        };

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(ProbeResult::reachable(latency_ms).with_mode(ack.and_then(|a| a.mode)))
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, endpoint: &Endpoint) -> ProbeResult {
        let outcome = match tokio::time::timeout(self.timeout, self.check(endpoint)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeFailure::TimedOut(self.timeout)),
        };
        match outcome {
            Ok(result) => result,
            Err(err) => {
                debug!(endpoint = %endpoint.role, base_url = %endpoint.base_url, error = %err, "health probe failed");
                ProbeResult::unreachable()
            }
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
        serde_json::Value::Null => false,
    }
}
