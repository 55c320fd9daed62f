// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./campuslink.toml` > `~/.config/campuslink/campuslink.toml`
//! > `/etc/campuslink/campuslink.toml`, with environment variable overrides via
//! the `CAMPUSLINK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CampusLinkConfig;

pub(crate) const LOCAL_CONFIG: &str = "campuslink.toml";
pub(crate) const SYSTEM_CONFIG: &str = "/etc/campuslink/campuslink.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("campuslink").join(LOCAL_CONFIG))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/campuslink/campuslink.toml` (system-wide)
/// 3. `~/.config/campuslink/campuslink.toml` (user XDG config)
/// 4. `./campuslink.toml` (local directory)
/// 5. `CAMPUSLINK_*` environment variables
pub fn load_config() -> Result<CampusLinkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CampusLinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CampusLinkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CampusLinkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CampusLinkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CampusLinkConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with an explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CAMPUSLINK_ENDPOINTS_PRIMARY_URL` must become
/// `endpoints.primary_url`, not `endpoints.primary.url`.
fn env_provider() -> Env {
    Env::prefixed("CAMPUSLINK_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("client_", "client.", 1)
            .replacen("endpoints_", "endpoints.", 1)
            .replacen("host_", "host.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("chat_", "chat.", 1);
        mapped.into()
    })
}

/// Render a configuration as TOML, e.g. to show the effective settings.
pub fn to_toml_string(config: &CampusLinkConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}
