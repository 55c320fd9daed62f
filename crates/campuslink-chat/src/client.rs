// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the backend's `/chat/ask` route.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use campuslink_config::model::ChatConfig;
use campuslink_core::{AskRequest, AskResponse, CampusLinkError, MessageSender};

/// Delivers chat questions with `POST {base}{ask_path}`.
#[derive(Debug, Clone)]
pub struct AskClient {
    client: reqwest::Client,
    ask_path: String,
}

impl AskClient {
    pub fn new(ask_path: impl Into<String>, timeout: Duration) -> Result<Self, CampusLinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CampusLinkError::Delivery {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            ask_path: ask_path.into(),
        })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, CampusLinkError> {
        Self::new(config.ask_path.clone(), config.request_timeout())
    }

    fn ask_url(&self, base_url: &Url) -> Result<Url, CampusLinkError> {
        let base = base_url.as_str().trim_end_matches('/');
        let path = self.ask_path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| CampusLinkError::delivery(format!("bad ask url for {base_url}: {e}")))
    }
}

#[async_trait]
impl MessageSender for AskClient {
    async fn deliver(
        &self,
        base_url: &Url,
        school: &str,
        question: &str,
    ) -> Result<AskResponse, CampusLinkError> {
        let url = self.ask_url(base_url)?;
        let request = AskRequest {
            school: school.to_string(),
            question: question.to_string(),
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CampusLinkError::Delivery {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            warn!(status = %status, school, detail = %detail, "ask request rejected");
            return Err(CampusLinkError::delivery(format!(
                "backend returned {status}: {detail}"
            )));
        }

        let answer: AskResponse = response.json().await.map_err(|e| CampusLinkError::Delivery {
            message: format!("malformed answer: {e}"),
            source: Some(Box::new(e)),
        })?;

        debug!(
            school,
            sources = answer.sources.len(),
            degraded = answer.is_degraded(),
            "answer received"
        );
        Ok(answer)
    }
}

/// Extracts a readable message from an error body: FastAPI's `detail`
/// field when present, otherwise the JSON itself.
fn error_detail(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    match json.get("detail") {
        Some(serde_json::Value::String(detail)) => Some(detail.clone()),
        Some(detail) if !detail.is_null() => Some(detail.to_string()),
        _ => Some(json.to_string()),
    }
}
