//! Remote dispatch: optimistic echo, placeholder lifecycle, timeout budgets
//! with a single extended retry, and reply normalization.

use std::sync::Arc;
use std::time::Duration;

use assistant_client::{AssistantClient, AssistantError, AssistantReply};
use civi_core::{is_command, ChatMessage};
use command_handlers::{CMD_GREET, FAQ_CATEGORY_PREFIX};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::message_store::{MessageStore, SEARCHING_PLACEHOLDER};

/// Reply element with no text.
pub const NO_REPLY_TEXT: &str = "Lo siento, no tengo respuesta para eso.";
/// Assistant answered with an empty array.
pub const NO_RESULTS_TEXT: &str =
    "No encontré información para esa consulta. Probá con otras palabras o elegí otra categoría.";
/// Transport failure, non-2xx status, or exhausted retry.
pub const CONNECTION_ERROR_TEXT: &str = "Error: No se pudo conectar con CiviBot.";

/// Timeout budgets. Greeting and FAQ-category turns get the larger budget
/// because the assistant answers them from a cold start; a timed-out call is
/// retried exactly once with `retry_bonus` added.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub base: Duration,
    pub command_base: Duration,
    pub retry_bonus: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(15),
            command_base: Duration::from_secs(25),
            retry_bonus: Duration::from_secs(10),
        }
    }
}

/// Transient state of one outgoing remote call; dropped when it settles.
struct PendingRequest {
    content: String,
    budget: Duration,
    attempt: u8,
}

/// Delivers user inputs to the conversational endpoint and appends the
/// normalized outcome to the message store. Failures never escape: the worst
/// outcome is the fixed connection-error message.
pub struct RemoteDispatcher {
    assistant: AssistantClient,
    store: Arc<MessageStore>,
    policy: DispatchPolicy,
    bot_name: String,
    username: String,
    sender_id: String,
}

impl RemoteDispatcher {
    pub fn new(
        assistant: AssistantClient,
        store: Arc<MessageStore>,
        bot_name: impl Into<String>,
        username: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            assistant,
            store,
            policy: DispatchPolicy::default(),
            bot_name: bot_name.into(),
            username: username.into(),
            sender_id: sender_id.into(),
        }
    }

    /// Overrides the timeout budgets (tests use millisecond-scale budgets).
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sends one user input to the assistant. Free text is echoed as a
    /// user-authored message before any network I/O; FAQ-category payloads
    /// get a transient placeholder that is removed whatever the outcome.
    #[instrument(skip(self, content), fields(sender_id = %self.sender_id))]
    pub async fn dispatch(&self, content: &str) {
        let is_faq = content.starts_with(FAQ_CATEGORY_PREFIX);

        let correlation_id = if !is_command(content) {
            let echo = ChatMessage::from_user(&self.username, content);
            let id = echo.id.clone();
            self.store.push(echo);
            id
        } else {
            Uuid::new_v4().to_string()
        };

        if is_faq {
            self.store
                .push(ChatMessage::from_bot(&self.bot_name, SEARCHING_PLACEHOLDER));
        }

        match self.converse_with_retry(content).await {
            Ok(replies) => {
                if is_faq {
                    self.store.clear_placeholder();
                }
                if replies.is_empty() {
                    self.store
                        .push(ChatMessage::from_bot(&self.bot_name, NO_RESULTS_TEXT));
                } else {
                    self.store
                        .extend(self.normalize_replies(&correlation_id, replies));
                }
            }
            Err(e) => {
                warn!(error = %e, "assistant dispatch failed");
                self.store
                    .push_error(ChatMessage::from_bot(&self.bot_name, CONNECTION_ERROR_TEXT));
            }
        }
    }

    /// One call under the content's budget; a timeout is retried exactly once
    /// with the extended budget. Any other failure propagates without retry.
    async fn converse_with_retry(
        &self,
        content: &str,
    ) -> Result<Vec<AssistantReply>, AssistantError> {
        let mut pending = PendingRequest {
            content: content.to_string(),
            budget: self.budget_for(content),
            attempt: 0,
        };
        loop {
            pending.attempt += 1;
            match self
                .assistant
                .converse(&self.sender_id, &pending.content, pending.budget)
                .await
            {
                Err(e) if e.is_timeout() && pending.attempt == 1 => {
                    pending.budget += self.policy.retry_bonus;
                    info!(
                        budget_ms = pending.budget.as_millis() as u64,
                        "assistant call timed out, retrying once with extended budget"
                    );
                }
                settled => return settled,
            }
        }
    }

    fn budget_for(&self, content: &str) -> Duration {
        if content.starts_with(CMD_GREET) || content.starts_with(FAQ_CATEGORY_PREFIX) {
            self.policy.command_base
        } else {
            self.policy.base
        }
    }

    /// Maps the reply array to bot messages keyed `<correlation>-bot-<index>`
    /// so replies to one turn stay distinguishable but stably ordered.
    fn normalize_replies(
        &self,
        correlation_id: &str,
        replies: Vec<AssistantReply>,
    ) -> Vec<ChatMessage> {
        replies
            .into_iter()
            .enumerate()
            .map(|(index, reply)| {
                let text = reply
                    .text
                    .unwrap_or_else(|| NO_REPLY_TEXT.to_string());
                let mut message = ChatMessage::from_bot(&self.bot_name, text)
                    .with_id(format!("{correlation_id}-bot-{index}"));
                if !reply.buttons.is_empty() {
                    message = message.with_buttons(reply.buttons);
                }
                message
            })
            .collect()
    }
}
