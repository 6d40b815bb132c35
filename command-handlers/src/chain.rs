//! Ordered chain of command handlers; the first Reply ends the walk.

use civi_core::{CommandHandler, CommandOutcome, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Chain of local command handlers, offered the outgoing content in
/// registration order. The first handler returning
/// [`CommandOutcome::Reply`] answers the command; when every handler returns
/// [`CommandOutcome::Continue`] the content goes to the remote assistant.
#[derive(Clone, Default)]
pub struct CommandChain {
    handlers: Vec<Arc<dyn CommandHandler>>,
}

impl CommandChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler (tried in registration order).
    pub fn add_handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Walks the chain. Returns the first Reply, or Continue when no handler
    /// recognized the content.
    pub async fn handle(&self, content: &str) -> Result<CommandOutcome> {
        for handler in &self.handlers {
            let handler_name = std::any::type_name_of_val(handler.as_ref());
            let outcome = handler.handle(content).await?;
            debug!(handler = %handler_name, outcome = ?outcome, "command handler consulted");
            if let CommandOutcome::Reply(messages) = outcome {
                info!(
                    handler = %handler_name,
                    replies = messages.len(),
                    "command intercepted locally"
                );
                return Ok(CommandOutcome::Reply(messages));
            }
        }
        Ok(CommandOutcome::Continue)
    }
}

// Unit/integration tests live in tests/command_chain_test.rs
