// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wiremock helpers that stand in for the campus backend.
//!
//! The fake mirrors the real routes: `GET /health` answering
//! `{ok, mode, ts}` and `POST /chat/ask` answering `{answer, sources}`.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Health acknowledgement body in the backend's shape.
pub fn health_body(mode: &str) -> serde_json::Value {
    json!({ "ok": true, "mode": mode, "ts": 1_760_000_000.0 })
}

/// Mounts a healthy `/health` route that answers after `delay`.
pub async fn mount_health(server: &MockServer, mode: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(health_body(mode))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Mounts a `/health` route that always returns `status`.
pub async fn mount_health_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a `/chat/ask` route answering every question with `answer`.
pub async fn mount_ask(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": answer,
            "sources": [{ "i": 1, "text": "Catalog 2025", "url": "https://example.edu/catalog" }],
        })))
        .mount(server)
        .await;
}

/// Starts a backend that is healthy and answers questions.
pub async fn healthy_backend(mode: &str, answer: &str) -> MockServer {
    let server = MockServer::start().await;
    mount_health(&server, mode, Duration::ZERO).await;
    mount_ask(&server, answer).await;
    server
}

/// Request bodies received on `/chat/ask`, in arrival order.
pub async fn asked_questions(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == "/chat/ask")
        .filter_map(|req| serde_json::from_slice(&req.body).ok())
        .collect()
}

/// Number of requests `server` received on `path`.
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|req| req.url.path() == route)
        .count()
}
