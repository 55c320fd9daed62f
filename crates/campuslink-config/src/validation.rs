// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks the constraints serde cannot express: endpoint URLs that parse
//! with an http(s) scheme, request paths, and sane probe timing.

use url::Url;

use crate::diagnostic::ConfigError;
use crate::model::CampusLinkConfig;

const MIN_POLL_INTERVAL_MS: u64 = 500;
const PROBE_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=10_000;
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure rather than stopping at the first one.
pub fn validate_config(config: &CampusLinkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let endpoints = &config.endpoints;

    check_url(&mut errors, "endpoints.primary_url", &endpoints.primary_url);
    if let Some(secondary) = endpoints.secondary_url.as_deref() {
        if !secondary.trim().is_empty() {
            check_url(&mut errors, "endpoints.secondary_url", secondary);
        }
    }

    check_path(&mut errors, "endpoints.health_path", &endpoints.health_path);
    check_path(&mut errors, "chat.ask_path", &config.chat.ask_path);

    if endpoints.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        errors.push(ConfigError::invalid(
            "endpoints.poll_interval_ms",
            format!(
                "must be at least {MIN_POLL_INTERVAL_MS}, got {}",
                endpoints.poll_interval_ms
            ),
        ));
    }

    if !PROBE_TIMEOUT_RANGE_MS.contains(&endpoints.probe_timeout_ms) {
        errors.push(ConfigError::invalid(
            "endpoints.probe_timeout_ms",
            format!(
                "must be between {} and {}, got {}",
                PROBE_TIMEOUT_RANGE_MS.start(),
                PROBE_TIMEOUT_RANGE_MS.end(),
                endpoints.probe_timeout_ms
            ),
        ));
    } else {
        // One cycle probes the primary and then possibly the secondary.
        let probes_per_cycle = if has_secondary(config) { 2 } else { 1 };
        let worst_cycle_ms = endpoints.probe_timeout_ms * probes_per_cycle;
        if worst_cycle_ms >= endpoints.poll_interval_ms {
            errors.push(ConfigError::invalid(
                "endpoints.probe_timeout_ms",
                format!(
                    "{probes_per_cycle} x {} must be shorter than poll_interval_ms ({})",
                    endpoints.probe_timeout_ms, endpoints.poll_interval_ms
                ),
            ));
        }
    }

    if config.chat.request_timeout_secs == 0 {
        errors.push(ConfigError::invalid(
            "chat.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if !LOG_LEVELS.contains(&config.client.log_level.as_str()) {
        errors.push(ConfigError::invalid(
            "client.log_level",
            format!(
                "`{}` is not one of {}",
                config.client.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_secondary(config: &CampusLinkConfig) -> bool {
    config
        .endpoints
        .secondary_url
        .as_deref()
        .is_some_and(|url| !url.trim().is_empty())
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, raw: &str) {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ConfigError::invalid(
            key,
            format!("scheme must be http or https, got `{}`", url.scheme()),
        )),
        Err(e) => errors.push(ConfigError::invalid(key, format!("`{raw}` is not a URL: {e}"))),
    }
}

fn check_path(errors: &mut Vec<ConfigError>, key: &str, path: &str) {
    if !path.starts_with('/') {
        errors.push(ConfigError::invalid(
            key,
            format!("`{path}` must start with `/`"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error_for(errors: &[ConfigError], wanted: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidValue { key, .. } if key == wanted))
    }

    #[test]
    fn default_config_validates() {
        let config = CampusLinkConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CampusLinkConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "storage.database_path"));
    }

    #[test]
    fn primary_url_must_parse() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.primary_url = "not a url".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "endpoints.primary_url"));
    }

    #[test]
    fn secondary_url_rejects_websocket_scheme() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.secondary_url = Some("ws://edge.local:8000".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "endpoints.secondary_url"));
    }

    #[test]
    fn blank_secondary_url_is_allowed() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.secondary_url = Some(String::new());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn probe_timeout_must_be_below_poll_interval() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.poll_interval_ms = 1000;
        config.endpoints.probe_timeout_ms = 1500;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "endpoints.probe_timeout_ms"));
    }

    #[test]
    fn secondary_doubles_the_probe_budget() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.poll_interval_ms = 4000;
        config.endpoints.probe_timeout_ms = 2500;
        assert!(validate_config(&config).is_ok());

        config.endpoints.secondary_url = Some("https://edge.campus.local".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "endpoints.probe_timeout_ms"));
    }

    #[test]
    fn tiny_poll_interval_fails() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.poll_interval_ms = 100;
        config.endpoints.probe_timeout_ms = 100;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "endpoints.poll_interval_ms"));
    }

    #[test]
    fn relative_health_path_fails() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.health_path = "health".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error_for(&errors, "endpoints.health_path"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = CampusLinkConfig::default();
        config.endpoints.primary_url = String::new();
        config.chat.ask_path = "ask".to_string();
        config.client.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
    }
}
