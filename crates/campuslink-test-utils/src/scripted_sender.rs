// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message sender that records every delivery attempt.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use url::Url;

use campuslink_core::{AskResponse, CampusLinkError, MessageSender};

/// One recorded call to [`MessageSender::deliver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub base_url: Url,
    pub school: String,
    pub question: String,
    pub succeeded: bool,
}

#[derive(Default)]
struct State {
    attempts: Vec<Delivery>,
    fail_texts: HashSet<String>,
    fail_all: bool,
    delay: Duration,
}

/// A sender that answers `echo: {question}` unless told to fail.
#[derive(Clone, Default)]
pub struct ScriptedSender {
    state: Arc<Mutex<State>>,
}

impl ScriptedSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery of `question` fail until [`heal`](Self::heal).
    pub async fn fail_on(&self, question: &str) {
        self.state.lock().await.fail_texts.insert(question.to_string());
    }

    /// Makes every delivery fail until [`heal`](Self::heal).
    pub async fn fail_all(&self) {
        self.state.lock().await.fail_all = true;
    }

    /// Waits `delay` (on the tokio clock) before answering each call.
    pub async fn set_delay(&self, delay: Duration) {
        self.state.lock().await.delay = delay;
    }

    /// Clears all scripted failures.
    pub async fn heal(&self) {
        let mut state = self.state.lock().await;
        state.fail_texts.clear();
        state.fail_all = false;
    }

    /// Every attempt, successful or not, in call order.
    pub async fn attempts(&self) -> Vec<Delivery> {
        self.state.lock().await.attempts.clone()
    }

    /// Questions that were delivered successfully, in order.
    pub async fn delivered(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .attempts
            .iter()
            .filter(|d| d.succeeded)
            .map(|d| d.question.clone())
            .collect()
    }
}

#[async_trait]
impl MessageSender for ScriptedSender {
    async fn deliver(
        &self,
        base_url: &Url,
        school: &str,
        question: &str,
    ) -> Result<AskResponse, CampusLinkError> {
        let delay = self.state.lock().await.delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().await;
        let fails = state.fail_all || state.fail_texts.contains(question);
        state.attempts.push(Delivery {
            base_url: base_url.clone(),
            school: school.to_string(),
            question: question.to_string(),
            succeeded: !fails,
        });
        if fails {
            return Err(CampusLinkError::delivery(format!(
                "scripted failure for `{question}`"
            )));
        }
        Ok(AskResponse {
            answer: format!("echo: {question}"),
            sources: Vec::new(),
        })
    }
}
