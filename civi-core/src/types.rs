//! Core types: message author, suggestion buttons, chat message, and the CommandHandler trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Leading character denoting a structured payload rather than free text.
pub const COMMAND_MARKER: char = '/';

/// Whether `content` is a command payload (starts with the command marker).
pub fn is_command(content: &str) -> bool {
    content.starts_with(COMMAND_MARKER)
}

/// Display identity of a message author (the citizen or the bot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
}

/// Suggestion button attached to a bot message. `payload` is sent back
/// verbatim as the next outgoing content when the user picks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub payload: String,
}

/// A single chat message. Immutable once created; `id` is the deduplication key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub author: Author,
    /// Assigned at construction time, not at append time; missing or
    /// unparseable timestamps coerce to the Unix epoch at the serde boundary.
    #[serde(default = "unix_epoch", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// Accepts any JSON value for `created_at`; anything that is not an RFC 3339
/// string sorts as the earliest possible instant instead of failing the message.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    Ok(parsed.unwrap_or(DateTime::UNIX_EPOCH))
}

impl ChatMessage {
    fn new(author: &str, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author: Author {
                name: author.to_string(),
            },
            created_at: Utc::now(),
            buttons: Vec::new(),
        }
    }

    /// A message typed by the citizen.
    pub fn from_user(username: &str, content: impl Into<String>) -> Self {
        Self::new(username, content)
    }

    /// A synthetic bot reply (local interception, booking output, fallbacks).
    pub fn from_bot(bot_name: &str, content: impl Into<String>) -> Self {
        Self::new(bot_name, content)
    }

    /// Attaches suggestion buttons.
    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Overrides the generated id (e.g. correlation-derived reply ids).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sort key upholding the message-list invariant: non-decreasing
    /// `created_at`, ties broken by ascending lexicographic `id`.
    pub fn order_key(&self) -> (DateTime<Utc>, &str) {
        (self.created_at, &self.id)
    }
}

/// Result of offering one outgoing content to a command handler.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Not this handler's command; try the next one (or go remote).
    Continue,
    /// Command recognized; these bot messages answer it locally.
    Reply(Vec<ChatMessage>),
}

/// A local command: inspects outgoing content and either answers it with
/// synthetic bot messages or lets it pass through to the remote assistant.
/// Handlers never append to the store themselves; the caller does.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, content: &str) -> crate::error::Result<CommandOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command() {
        assert!(is_command("/greet"));
        assert!(is_command("/faq_gcba{\"process_category\":\"Salud\"}"));
        assert!(!is_command("hola, necesito un turno"));
        assert!(!is_command(""));
    }

    #[test]
    fn test_constructors_assign_id_and_timestamp() {
        let a = ChatMessage::from_bot("CiviBot", "hola");
        let b = ChatMessage::from_bot("CiviBot", "hola");
        assert_ne!(a.id, b.id);
        assert!(a.created_at <= b.created_at);
        assert_eq!(a.author.name, "CiviBot");
        assert!(a.buttons.is_empty());
    }

    #[test]
    fn test_missing_timestamp_coerces_to_epoch() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":"m1","content":"x","author":{"name":"CiviBot"}}"#,
        )
        .unwrap();
        assert_eq!(msg.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_unparseable_timestamp_coerces_to_epoch() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":"m1","content":"x","author":{"name":"CiviBot"},"created_at":"not-a-date"}"#,
        )
        .unwrap();
        assert_eq!(msg.created_at, DateTime::UNIX_EPOCH);

        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":"m2","content":"x","author":{"name":"CiviBot"},"created_at":42}"#,
        )
        .unwrap();
        assert_eq!(msg.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_valid_timestamp_round_trips() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":"m1","content":"x","author":{"name":"CiviBot"},"created_at":"2025-03-10T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.created_at.to_rfc3339(), "2025-03-10T10:00:00+00:00");
    }
}
