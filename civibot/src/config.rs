//! Session configuration: env-based loading with defaults.

use std::env;

/// Runtime configuration for one assistant session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Conversational endpoint (Rasa-style REST webhook).
    /// 127.0.0.1 rather than localhost: some hosts resolve localhost in a way
    /// that breaks the webhook connection.
    pub assistant_url: String,
    /// Municipal-records proxy base URL.
    pub records_url: String,
    pub bot_name: String,
    pub username: String,
    /// Room label; the sender identity derives from it.
    pub room: String,
    pub log_file: String,
}

impl Config {
    /// Loads from environment variables, with working local defaults.
    pub fn from_env() -> Self {
        Self {
            assistant_url: env::var("ASSISTANT_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5005/webhooks/rest/webhook".to_string()),
            records_url: env::var("RECORDS_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api/v1".to_string()),
            bot_name: env::var("BOT_NAME").unwrap_or_else(|_| "CiviBot".to_string()),
            username: env::var("CHAT_USERNAME").unwrap_or_else(|_| "Ciudadano".to_string()),
            room: env::var("CHAT_ROOM").unwrap_or_else(|_| "Main-Session".to_string()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "civibot.log".to_string()),
        }
    }

    /// Stable per-session token correlating all messages sent to the
    /// conversational endpoint.
    pub fn sender_id(&self) -> String {
        format!("{}-Session-{}", self.bot_name, self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_id_derives_from_bot_and_room() {
        let config = Config {
            assistant_url: String::new(),
            records_url: String::new(),
            bot_name: "CiviBot".to_string(),
            username: "Ciudadano".to_string(),
            room: "plaza".to_string(),
            log_file: String::new(),
        };
        assert_eq!(config.sender_id(), "CiviBot-Session-plaza");
    }
}
