// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `campuslink status` command implementation.
//!
//! Runs a single classification cycle against the configured endpoints
//! and prints the result. `--json` emits a structured report for scripts.

use std::io::IsTerminal;
use std::sync::Arc;

use campuslink_config::CampusLinkConfig;
use campuslink_core::{CampusLinkError, ConnectivityState, EndpointRole, ProbeResult};
use campuslink_net::{Classification, Classifier, HttpProbe, SecondaryOutcome};
use serde::Serialize;

/// Per-endpoint part of the report.
#[derive(Debug, Serialize)]
pub struct EndpointReport {
    pub url: String,
    /// `reachable`, `unreachable`, `not-attempted`, or `blocked`.
    pub status: &'static str,
    pub latency_ms: Option<u64>,
    pub mode: Option<String>,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state: ConnectivityState,
    pub badge: String,
    pub can_send: bool,
    pub base_url: Option<String>,
    pub secure_context: bool,
    pub primary: EndpointReport,
    pub secondary: Option<EndpointReport>,
}

fn probed(url: String, result: &ProbeResult) -> EndpointReport {
    EndpointReport {
        url,
        status: if result.reachable {
            "reachable"
        } else {
            "unreachable"
        },
        latency_ms: result.latency_ms,
        mode: result.mode.clone(),
    }
}

fn build_report(
    classifier: &Classifier,
    classification: &Classification,
    secure_context: bool,
) -> StatusReport {
    let url_of = |role: EndpointRole| {
        classifier
            .endpoint(role)
            .map(|ep| ep.base_url.to_string())
            .unwrap_or_default()
    };

    let secondary = classifier.endpoint(EndpointRole::Secondary).map(|_| {
        let url = url_of(EndpointRole::Secondary);
        match &classification.secondary {
            SecondaryOutcome::Probed { result } => probed(url, result),
            SecondaryOutcome::Blocked => EndpointReport {
                url,
                status: "blocked",
                latency_ms: None,
                mode: None,
            },
            SecondaryOutcome::NotAttempted | SecondaryOutcome::NotConfigured => EndpointReport {
                url,
                status: "not-attempted",
                latency_ms: None,
                mode: None,
            },
        }
    });

    let state = classification.state;
    let active_latency = match state {
        ConnectivityState::PrimaryReachable => classification.primary.latency_ms,
        ConnectivityState::SecondaryReachable => {
            classification.secondary_result().and_then(|r| r.latency_ms)
        }
        ConnectivityState::Unreachable | ConnectivityState::Blocked => None,
    };

    StatusReport {
        state,
        badge: state.badge(active_latency),
        can_send: state.can_send(),
        base_url: classifier.base_url_for(state).map(|u| u.to_string()),
        secure_context,
        primary: probed(url_of(EndpointRole::Primary), &classification.primary),
        secondary,
    }
}

/// Run the `campuslink status` command.
///
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub async fn run_status(
    config: &CampusLinkConfig,
    json: bool,
    plain: bool,
) -> Result<(), CampusLinkError> {
    let probe = Arc::new(HttpProbe::from_config(&config.endpoints)?);
    let classifier = Classifier::from_config(config, probe)?;
    let classification = classifier.classify().await;
    let report = build_report(&classifier, &classification, config.host.secure_context);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_report(&report, use_color);
    }
    Ok(())
}

fn print_endpoint(label: &str, endpoint: &EndpointReport, use_color: bool) {
    let latency = endpoint
        .latency_ms
        .map(|ms| format!(" ({ms}ms)"))
        .unwrap_or_default();
    let status = if use_color {
        use colored::Colorize;
        match endpoint.status {
            "reachable" => endpoint.status.green().to_string(),
            "blocked" => endpoint.status.yellow().to_string(),
            "unreachable" => endpoint.status.red().to_string(),
            other => other.dimmed().to_string(),
        }
    } else {
        endpoint.status.to_string()
    };
    println!("    {label:<10}{status}{latency}  {}", endpoint.url);
}

fn print_report(report: &StatusReport, use_color: bool) {
    println!();
    println!("  campuslink status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let badge = match report.state {
            ConnectivityState::PrimaryReachable | ConnectivityState::SecondaryReachable => {
                report.badge.green()
            }
            ConnectivityState::Blocked => report.badge.yellow(),
            ConnectivityState::Unreachable => report.badge.red(),
        };
        println!("    State:    {badge}");
    } else {
        let tag = if report.can_send { "[OK]" } else { "[FAIL]" };
        println!("    State:    {tag} {}", report.badge);
    }

    print_endpoint("Primary:", &report.primary, use_color);
    if let Some(secondary) = &report.secondary {
        print_endpoint("Edge:", secondary, use_color);
    }
    if let Some(base_url) = &report.base_url {
        println!("    Sending:  {base_url}");
    }
    if report.state == ConnectivityState::Blocked {
        println!();
        println!("  The edge endpoint is plain http and this host is secure.");
        println!("  Serve the edge over https or set host.secure_context = false.");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use campuslink_core::Endpoint;
    use campuslink_test_utils::ScriptedProbe;

    fn classifier(probe: &ScriptedProbe, secondary: Option<&str>, secure: bool) -> Classifier {
        Classifier::new(
            Arc::new(probe.clone()),
            Endpoint::parse(EndpointRole::Primary, "https://api.campus.edu").unwrap(),
            secondary.map(|raw| Endpoint::parse(EndpointRole::Secondary, raw).unwrap()),
            secure,
        )
    }

    #[tokio::test]
    async fn report_for_primary() {
        let probe = ScriptedProbe::new();
        probe
            .set(
                EndpointRole::Primary,
                ProbeResult::reachable(42).with_mode(Some("cloud".into())),
            )
            .await;
        let c = classifier(&probe, Some("https://edge.local"), false);
        let report = build_report(&c, &c.classify().await, false);

        assert_eq!(report.badge, "Online · Cloud 42ms");
        assert!(report.can_send);
        assert_eq!(report.base_url.as_deref(), Some("https://api.campus.edu/"));
        assert_eq!(report.primary.mode.as_deref(), Some("cloud"));
        assert_eq!(report.secondary.unwrap().status, "not-attempted");
    }

    #[tokio::test]
    async fn report_for_blocked_edge() {
        let probe = ScriptedProbe::new();
        let c = classifier(&probe, Some("http://edge.local:8000"), true);
        let report = build_report(&c, &c.classify().await, true);

        assert_eq!(report.state, ConnectivityState::Blocked);
        assert_eq!(report.badge, "Blocked (Mixed Content)");
        assert_eq!(report.base_url, None);
        assert_eq!(report.secondary.unwrap().status, "blocked");
    }

    #[tokio::test]
    async fn report_serializes_state_in_kebab_case() {
        let probe = ScriptedProbe::new();
        let c = classifier(&probe, None, false);
        let report = build_report(&c, &c.classify().await, false);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["state"], "unreachable");
        assert_eq!(json["can_send"], false);
        assert!(json["secondary"].is_null());
        assert_eq!(json["primary"]["status"], "unreachable");
    }
}
