// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for campuslink.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use campuslink_core::{CampusLinkError, Endpoint, EndpointRole};
use serde::{Deserialize, Serialize};

/// Top-level campuslink configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CampusLinkConfig {
    /// Client identity and logging.
    #[serde(default)]
    pub client: ClientConfig,

    /// Backend endpoints and probe timing.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Properties of the hosting context.
    #[serde(default)]
    pub host: HostConfig,

    /// Queue persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat delivery settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Client identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Display name used in logs and status output.
    #[serde(default = "default_client_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: default_client_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_client_name() -> String {
    "campuslink".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointsConfig {
    /// Base URL of the cloud backend.
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Base URL of the edge gateway. `None` disables the fallback.
    #[serde(default)]
    pub secondary_url: Option<String>,

    /// Path of the liveness endpoint, appended to each base URL.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Milliseconds between classification cycles.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Milliseconds before a single probe is abandoned.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Require a JSON `{"ok": true}` body in addition to a 2xx status.
    #[serde(default)]
    pub require_ack: bool,

    /// Append a timestamp query parameter to defeat intermediate caches.
    #[serde(default = "default_cache_bust")]
    pub cache_bust: bool,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            secondary_url: None,
            health_path: default_health_path(),
            poll_interval_ms: default_poll_interval_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            require_ack: false,
            cache_bust: default_cache_bust(),
        }
    }
}

impl EndpointsConfig {
    pub fn primary(&self) -> Result<Endpoint, CampusLinkError> {
        Endpoint::parse(EndpointRole::Primary, &self.primary_url)
    }

    /// The edge endpoint, or `None` when unset or blank.
    pub fn secondary(&self) -> Result<Option<Endpoint>, CampusLinkError> {
        match self.secondary_url.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Endpoint::parse(EndpointRole::Secondary, raw).map(Some),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn default_primary_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_poll_interval_ms() -> u64 {
    4000
}

fn default_probe_timeout_ms() -> u64 {
    1800
}

fn default_cache_bust() -> bool {
    true
}

/// Hosting context configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// The embedding page or process is served over HTTPS, so plain-HTTP
    /// endpoints are refused as mixed content.
    #[serde(default)]
    pub secure_context: bool,
}

/// Queue persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding queued messages.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("campuslink").join("queue.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("campuslink-queue.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Chat delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Path of the ask endpoint, appended to the active base URL.
    #[serde(default = "default_ask_path")]
    pub ask_path: String,

    /// Overall timeout for one ask request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// School slug used when the CLI is not given one.
    #[serde(default)]
    pub default_school: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            ask_path: default_ask_path(),
            request_timeout_secs: default_request_timeout_secs(),
            default_school: None,
        }
    }
}

impl ChatConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_ask_path() -> String {
    "/chat/ask".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}
