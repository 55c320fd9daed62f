// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the monitor, the outbox, and storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::error::CampusLinkError;

/// Phrases the backend puts in an answer when it failed internally but
/// still returned a success status.
const DEGRADED_ANSWER_MARKERS: &[&str] = &["Sorry, I'm having trouble", "Failed to process"];

/// Which of the two configured backends an endpoint is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// The cloud backend, preferred whenever it answers.
    Primary,
    /// The edge gateway, used only when the primary is down.
    Secondary,
}

/// A named remote backend with its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub role: EndpointRole,
    pub base_url: Url,
}

impl Endpoint {
    pub fn new(role: EndpointRole, base_url: Url) -> Self {
        Self { role, base_url }
    }

    /// Parses `raw` as an http(s) base URL.
    pub fn parse(role: EndpointRole, raw: &str) -> Result<Self, CampusLinkError> {
        let base_url = Url::parse(raw.trim())
            .map_err(|e| CampusLinkError::Config(format!("invalid {role} endpoint `{raw}`: {e}")))?;
        match base_url.scheme() {
            "http" | "https" => Ok(Self::new(role, base_url)),
            other => Err(CampusLinkError::Config(format!(
                "{role} endpoint `{raw}` must use http or https, got `{other}`"
            ))),
        }
    }

    /// True for plain-HTTP endpoints, which a secure host refuses to call.
    pub fn is_insecure(&self) -> bool {
        self.base_url.scheme() == "http"
    }

    /// Appends `path` to the base URL, keeping any path prefix the base has.
    ///
    /// `Url::join` would replace the prefix for absolute paths, so the two
    /// are concatenated as strings instead.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

/// The monitor's current belief about which backend can be used.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ConnectivityState {
    /// The primary endpoint answered its last probe.
    PrimaryReachable,
    /// The primary failed and the secondary answered in the same cycle.
    SecondaryReachable,
    /// Nothing answered, or the host reports it is offline.
    Unreachable,
    /// The primary failed and the secondary was never tried because it is
    /// plain HTTP while the host context is secure.
    Blocked,
}

impl ConnectivityState {
    /// True when outbound calls should go to the network now.
    pub fn can_send(self) -> bool {
        matches!(self, Self::PrimaryReachable | Self::SecondaryReachable)
    }

    /// The endpoint role backing this state, if any.
    pub fn active_role(self) -> Option<EndpointRole> {
        match self {
            Self::PrimaryReachable => Some(EndpointRole::Primary),
            Self::SecondaryReachable => Some(EndpointRole::Secondary),
            Self::Unreachable | Self::Blocked => None,
        }
    }

    /// Short badge text for status displays.
    pub fn label(self) -> &'static str {
        match self {
            Self::PrimaryReachable => "Online · Cloud",
            Self::SecondaryReachable => "Online · Edge",
            Self::Unreachable => "Offline (Queue)",
            Self::Blocked => "Blocked (Mixed Content)",
        }
    }

    /// Badge text with the active endpoint's latency appended when known.
    pub fn badge(self, latency_ms: Option<u64>) -> String {
        match latency_ms {
            Some(ms) if self.can_send() => format!("{} {ms}ms", self.label()),
            _ => self.label().to_string(),
        }
    }
}

/// Outcome of one liveness check against one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub reachable: bool,
    /// Round-trip time, present only when `reachable`.
    pub latency_ms: Option<u64>,
    /// Backend mode reported in the acknowledgement body (`cloud`, `offline`).
    pub mode: Option<String>,
}

impl ProbeResult {
    pub fn reachable(latency_ms: u64) -> Self {
        Self {
            reachable: true,
            latency_ms: Some(latency_ms),
            mode: None,
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Option<String>) -> Self {
        self.mode = mode;
        self
    }
}

/// Logical namespace for queued messages, usually one per school.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueKey(String);

impl QueueKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The chat queue for a school slug: `chat:{school}`.
    pub fn for_school(school: &str) -> Self {
        Self(format!("chat:{}", school.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which the queue is persisted: `queue:{key}`.
    pub fn storage_key(&self) -> String {
        format!("queue:{}", self.0)
    }
}

impl std::fmt::Display for QueueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: i64,
    pub text: String,
    pub enqueued_at: DateTime<Utc>,
}

/// Body of a `/chat/ask` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub school: String,
    pub question: String,
}

/// Body of a successful `/chat/ask` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<AnswerSource>,
}

impl AskResponse {
    /// True when the backend answered with one of its canned failure texts.
    pub fn is_degraded(&self) -> bool {
        DEGRADED_ANSWER_MARKERS
            .iter()
            .any(|marker| self.answer.contains(marker))
    }
}

/// Where part of an answer came from.
///
/// The backend returns two shapes: numbered document citations from the
/// retrieval pipeline, and named API sources for answers served by an
/// external service. Anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerSource {
    Citation {
        i: u32,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        url: Option<String>,
    },
    Api {
        #[serde(rename = "type")]
        kind: String,
        name: String,
    },
    Other(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_for_keeps_base_path() {
        let ep = Endpoint::parse(EndpointRole::Primary, "https://api.example.edu/v1/").unwrap();
        assert_eq!(
            ep.url_for("/health").unwrap().as_str(),
            "https://api.example.edu/v1/health"
        );
    }

    #[test]
    fn endpoint_rejects_non_http_scheme() {
        let err = Endpoint::parse(EndpointRole::Secondary, "ftp://edge.local").unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");
    }

    #[test]
    fn insecure_only_for_plain_http() {
        let http = Endpoint::parse(EndpointRole::Secondary, "http://edge.local:8000").unwrap();
        let https = Endpoint::parse(EndpointRole::Secondary, "https://edge.local").unwrap();
        assert!(http.is_insecure());
        assert!(!https.is_insecure());
    }

    #[test]
    fn only_reachable_states_can_send() {
        assert!(ConnectivityState::PrimaryReachable.can_send());
        assert!(ConnectivityState::SecondaryReachable.can_send());
        assert!(!ConnectivityState::Unreachable.can_send());
        assert!(!ConnectivityState::Blocked.can_send());
    }

    #[test]
    fn badge_shows_latency_only_when_online() {
        assert_eq!(
            ConnectivityState::PrimaryReachable.badge(Some(42)),
            "Online · Cloud 42ms"
        );
        assert_eq!(ConnectivityState::SecondaryReachable.badge(None), "Online · Edge");
        assert_eq!(ConnectivityState::Unreachable.badge(Some(9)), "Offline (Queue)");
    }

    #[test]
    fn state_display_is_kebab_case() {
        assert_eq!(
            ConnectivityState::SecondaryReachable.to_string(),
            "secondary-reachable"
        );
        let json = serde_json::to_string(&ConnectivityState::Blocked).unwrap();
        assert_eq!(json, "\"blocked\"");
    }

    #[test]
    fn queue_key_namespaces() {
        let key = QueueKey::for_school("sjsu");
        assert_eq!(key.as_str(), "chat:sjsu");
        assert_eq!(key.storage_key(), "queue:chat:sjsu");
    }

    #[test]
    fn ask_response_parses_both_source_shapes() {
        let body = serde_json::json!({
            "answer": "Take the 22 bus.",
            "sources": [
                {"i": 0, "text": "Parking", "url": "https://example.edu/p"},
                {"type": "api", "name": "Transit API"}
            ]
        });
        let resp: AskResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.sources.len(), 2);
        assert!(matches!(resp.sources[0], AnswerSource::Citation { i: 0, .. }));
        assert!(matches!(&resp.sources[1], AnswerSource::Api { name, .. } if name == "Transit API"));
        assert!(!resp.is_degraded());
    }

    #[test]
    fn ask_response_without_sources_defaults_empty() {
        let resp: AskResponse = serde_json::from_str(r#"{"answer":"hi"}"#).unwrap();
        assert!(resp.sources.is_empty());
    }

    #[test]
    fn degraded_answer_detected() {
        let resp = AskResponse {
            answer: "Sorry, I'm having trouble answering right now.".into(),
            sources: vec![],
        };
        assert!(resp.is_degraded());
    }
}
