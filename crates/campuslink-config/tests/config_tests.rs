// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the campuslink configuration system.

use campuslink_config::diagnostic::ConfigError;
use campuslink_config::model::CampusLinkConfig;
use campuslink_config::{
    load_and_validate_str, load_config_from_path, load_config_from_str, to_toml_string,
};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[client]
name = "kiosk-3"
log_level = "debug"

[endpoints]
primary_url = "https://api.example.edu"
secondary_url = "https://edge.campus.local"
health_path = "/health/ping"
poll_interval_ms = 5000
probe_timeout_ms = 2000
require_ack = true
cache_bust = false

[host]
secure_context = true

[storage]
database_path = "/tmp/queue.db"
wal_mode = false

[chat]
ask_path = "/v2/chat/ask"
request_timeout_secs = 10
default_school = "sjsu"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.client.name, "kiosk-3");
    assert_eq!(config.client.log_level, "debug");
    assert_eq!(config.endpoints.primary_url, "https://api.example.edu");
    assert_eq!(
        config.endpoints.secondary_url.as_deref(),
        Some("https://edge.campus.local")
    );
    assert_eq!(config.endpoints.health_path, "/health/ping");
    assert_eq!(config.endpoints.poll_interval_ms, 5000);
    assert_eq!(config.endpoints.probe_timeout_ms, 2000);
    assert!(config.endpoints.require_ack);
    assert!(!config.endpoints.cache_bust);
    assert!(config.host.secure_context);
    assert_eq!(config.storage.database_path, "/tmp/queue.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.chat.ask_path, "/v2/chat/ask");
    assert_eq!(config.chat.request_timeout_secs, 10);
    assert_eq!(config.chat.default_school.as_deref(), Some("sjsu"));
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.client.name, "campuslink");
    assert_eq!(config.client.log_level, "info");
    assert_eq!(config.endpoints.primary_url, "http://localhost:8000");
    assert!(config.endpoints.secondary_url.is_none());
    assert_eq!(config.endpoints.health_path, "/health");
    assert_eq!(config.endpoints.poll_interval_ms, 4000);
    assert_eq!(config.endpoints.probe_timeout_ms, 1800);
    assert!(!config.endpoints.require_ack);
    assert!(config.endpoints.cache_bust);
    assert!(!config.host.secure_context);
    assert!(config.storage.wal_mode);
    assert_eq!(config.chat.ask_path, "/chat/ask");
    assert_eq!(config.chat.request_timeout_secs, 30);
}

/// Unknown field in [endpoints] is rejected by deny_unknown_fields.
#[test]
fn unknown_field_in_endpoints_produces_error() {
    let toml = r#"
[endpoints]
primary_ulr = "http://a"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("primary_ulr"),
        "error should mention the unknown field, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telemetry"),
        "got: {err_str}"
    );
}

/// The diagnostic for a typo carries the suggestion and the valid keys.
#[test]
fn diagnostic_unknown_key_suggests_and_lists_keys() {
    let toml = r#"
[endpoints]
primary_ulr = "http://a"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "primary_ulr"
                && suggestion.as_deref() == Some("primary_url")
                && valid_keys.contains("poll_interval_ms")
        })
    });
    assert!(found, "expected UnknownKey for primary_ulr, got: {errors:?}");
}

/// A string where a number belongs yields an InvalidType diagnostic.
#[test]
fn diagnostic_invalid_type_names_the_key() {
    let toml = r#"
[endpoints]
poll_interval_ms = "often"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidType { key, .. } if key.contains("poll_interval_ms")
        )),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_rejects_bad_secondary_url() {
    let toml = r#"
[endpoints]
secondary_url = "edge.local:8000"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad URL should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::InvalidValue { key, .. } if key == "endpoints.secondary_url"
    )));
}

/// ConfigError renders through miette with its help text.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "primary_ulr".to_string(),
        suggestion: Some("primary_url".to_string()),
        valid_keys: "primary_url, secondary_url".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("should have help").to_string();
    assert!(help.contains("did you mean `primary_url`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("primary_ulr"));
}

/// CAMPUSLINK_ENDPOINTS_PRIMARY_URL maps to endpoints.primary_url, not
/// endpoints.primary.url.
#[test]
fn env_var_overrides_underscored_keys() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "campuslink.toml",
            r#"
[endpoints]
primary_url = "http://from-file:8000"
"#,
        )?;
        jail.set_env("CAMPUSLINK_ENDPOINTS_PRIMARY_URL", "https://from-env.example.edu");
        jail.set_env("CAMPUSLINK_HOST_SECURE_CONTEXT", "true");
        jail.set_env("CAMPUSLINK_CHAT_DEFAULT_SCHOOL", "deanza");

        let config: CampusLinkConfig =
            load_config_from_path(std::path::Path::new("campuslink.toml"))?;
        assert_eq!(config.endpoints.primary_url, "https://from-env.example.edu");
        assert!(config.host.secure_context);
        assert_eq!(config.chat.default_school.as_deref(), Some("deanza"));
        Ok(())
    });
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_file_uses_defaults() {
    figment::Jail::expect_with(|_jail| {
        let config = load_config_from_path(std::path::Path::new("/nonexistent/campuslink.toml"))?;
        assert_eq!(config.client.name, "campuslink");
        Ok(())
    });
}

#[test]
fn effective_config_renders_as_loadable_toml() {
    let mut config = CampusLinkConfig::default();
    config.endpoints.secondary_url = Some("http://edge.local:8000".to_string());
    config.chat.default_school = Some("sjsu".to_string());

    let rendered = to_toml_string(&config).unwrap();
    assert!(rendered.contains("[endpoints]"));

    let reloaded = load_and_validate_str(&rendered).unwrap();
    assert_eq!(
        reloaded.endpoints.secondary_url.as_deref(),
        Some("http://edge.local:8000")
    );
    assert_eq!(reloaded.chat.default_school.as_deref(), Some("sjsu"));
}
