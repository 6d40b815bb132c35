//! # Conversational-assistant client
//!
//! Delivers one user input to the assistant webhook
//! (`POST {sender, message}` → array of `{text?, buttons?}`) under a caller-
//! supplied timeout budget. Hitting the budget maps to
//! [`AssistantError::Timeout`] so the dispatcher can retry once with an
//! extended budget; an empty or malformed reply array is valid "no data",
//! never an error.

use std::time::Duration;

use civi_core::Button;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// One element of the assistant's reply array.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    sender: &'a str,
    message: &'a str,
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant request timed out after {0:?}")]
    Timeout(Duration),

    #[error("assistant returned status {0}")]
    Status(u16),

    #[error("assistant request failed: {0}")]
    Transport(String),
}

impl AssistantError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AssistantError::Timeout(_))
    }
}

/// Client for the assistant webhook. Cheap to clone; one `reqwest::Client`
/// shared across calls.
#[derive(Clone)]
pub struct AssistantClient {
    client: reqwest::Client,
    url: String,
}

impl AssistantClient {
    /// Builds a client for the given webhook URL
    /// (e.g. `http://127.0.0.1:5005/webhooks/rest/webhook`).
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Builds a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One webhook round-trip bounded by `budget`, covering connect through
    /// body read. Returns the ordered reply sequence; empty when the
    /// assistant had nothing to say.
    #[instrument(skip(self, message), fields(sender = %sender))]
    pub async fn converse(
        &self,
        sender: &str,
        message: &str,
        budget: Duration,
    ) -> Result<Vec<AssistantReply>, AssistantError> {
        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                AssistantError::Timeout(budget)
            } else {
                AssistantError::Transport(e.to_string())
            }
        };

        let resp = self
            .client
            .post(&self.url)
            .timeout(budget)
            .json(&WebhookRequest { sender, message })
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AssistantError::Status(status.as_u16()));
        }

        let body = resp.text().await.map_err(classify)?;
        debug!(bytes = body.len(), "assistant replied");
        Ok(parse_replies(&body))
    }
}

/// The "response is array" check, enforced once: anything that is not a JSON
/// array (or whose elements do not parse) degrades to "no reply".
fn parse_replies(body: &str) -> Vec<AssistantReply> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Ok(other) => {
            warn!(got = %other, "assistant reply was not an array, treating as no reply");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "malformed assistant reply, treating as no reply");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replies_array_with_buttons() {
        let replies = parse_replies(
            r#"[{"text":"Hola!"},{"text":"Elegí una opción","buttons":[{"title":"Salud","payload":"/faq_gcba{\"process_category\":\"Salud\"}"}]}]"#,
        );
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text.as_deref(), Some("Hola!"));
        assert_eq!(replies[1].buttons.len(), 1);
    }

    #[test]
    fn test_parse_replies_non_array_and_malformed_are_empty() {
        assert!(parse_replies(r#"{"text":"hola"}"#).is_empty());
        assert!(parse_replies("null").is_empty());
        assert!(parse_replies("<html>").is_empty());
        assert!(parse_replies("[]").is_empty());
    }
}
