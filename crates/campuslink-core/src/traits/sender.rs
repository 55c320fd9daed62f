// SPDX-FileCopyrightText: 2026 Campuslink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message delivery trait for the chat backend.

use async_trait::async_trait;
use url::Url;

use crate::error::CampusLinkError;
use crate::types::AskResponse;

/// Delivers one chat message to a backend endpoint.
///
/// The primary and secondary endpoints speak the same delivery contract,
/// so the caller picks the base URL and the sender only builds the request.
#[async_trait]
pub trait MessageSender: Send + Sync + 'static {
    /// Sends `question` on behalf of `school` to the backend at `base_url`.
    async fn deliver(
        &self,
        base_url: &Url,
        school: &str,
        question: &str,
    ) -> Result<AskResponse, CampusLinkError>;
}
