//! Chat session coordinator: local-vs-remote routing, the one-time greeting
//! guard, and the bot sink collaborators use to join the message stream.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use assistant_client::AssistantClient;
use civi_core::{ChatMessage, CommandOutcome};
use command_handlers::{
    CommandChain, ContactInfoHandler, EmergencyHandler, FaqMenuHandler, ProcedureListHandler,
    CMD_GREET,
};
use records_client::RecordsClient;
use tokio::sync::watch;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::dispatcher::{DispatchPolicy, RemoteDispatcher};
use crate::message_store::MessageStore;

/// Session-identity-keyed greeting guard: each session identity claims its
/// synthetic greeting at most once, surviving remounts of the same identity.
/// Set once, read once.
#[derive(Default)]
pub struct GreetRegistry {
    greeted: Mutex<HashSet<String>>,
}

impl GreetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only the first time `session_id` claims its greeting.
    pub fn claim(&self, session_id: &str) -> bool {
        self.greeted.lock().unwrap().insert(session_id.to_string())
    }
}

/// Handle for collaborators (the booking workflow) to inject synthetic
/// bot-authored messages into the session stream, indistinguishable from
/// conversational replies.
#[derive(Clone)]
pub struct BotSink {
    store: Arc<MessageStore>,
    bot_name: String,
}

impl BotSink {
    pub fn new(store: Arc<MessageStore>, bot_name: impl Into<String>) -> Self {
        Self {
            store,
            bot_name: bot_name.into(),
        }
    }

    /// Appends one bot message to the stream.
    pub fn push(&self, content: impl Into<String>) {
        self.store
            .push(ChatMessage::from_bot(&self.bot_name, content));
    }
}

/// Top-level coordinator for one chat session: routes each outgoing content
/// through the command chain first, then to the remote dispatcher; exposes
/// `subscribe` for observers and `bot_sink` for the booking workflow.
pub struct ChatSession {
    store: Arc<MessageStore>,
    chain: CommandChain,
    dispatcher: RemoteDispatcher,
    greetings: Arc<GreetRegistry>,
    session_id: String,
    bot_name: String,
}

impl ChatSession {
    /// Wires a session from config: records + assistant clients, the command
    /// chain, dispatcher, and an empty store.
    pub fn new(config: &Config, greetings: Arc<GreetRegistry>) -> Self {
        Self::with_policy(config, greetings, DispatchPolicy::default())
    }

    /// Same as [`ChatSession::new`] with explicit timeout budgets.
    pub fn with_policy(
        config: &Config,
        greetings: Arc<GreetRegistry>,
        policy: DispatchPolicy,
    ) -> Self {
        let store = Arc::new(MessageStore::new());
        let records = RecordsClient::new(&config.records_url);
        let assistant = AssistantClient::new(&config.assistant_url);
        let session_id = config.sender_id();

        let chain = CommandChain::new()
            .add_handler(Arc::new(ContactInfoHandler::new(&config.bot_name)))
            .add_handler(Arc::new(EmergencyHandler::new(&config.bot_name)))
            .add_handler(Arc::new(FaqMenuHandler::new(&config.bot_name)))
            .add_handler(Arc::new(ProcedureListHandler::new(
                &config.bot_name,
                records,
            )));

        let dispatcher = RemoteDispatcher::new(
            assistant,
            store.clone(),
            &config.bot_name,
            &config.username,
            &session_id,
        )
        .with_policy(policy);

        Self {
            store,
            chain,
            dispatcher,
            greetings,
            session_id,
            bot_name: config.bot_name.clone(),
        }
    }

    /// Routes one outgoing user action: blank input is ignored, the command
    /// chain answers local commands, everything else goes remote.
    #[instrument(skip(self, content), fields(session_id = %self.session_id))]
    pub async fn send(&self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }

        match self.chain.handle(content).await {
            Ok(CommandOutcome::Reply(messages)) => self.store.extend(messages),
            Ok(CommandOutcome::Continue) => self.dispatcher.dispatch(content).await,
            Err(e) => error!(error = %e, "command chain failed"),
        }
    }

    /// Fires the synthetic greeting at most once per session identity.
    pub async fn greet_if_new(&self) {
        if self.greetings.claim(&self.session_id) {
            info!(session_id = %self.session_id, "greeting session");
            self.dispatcher.dispatch(CMD_GREET).await;
        }
    }

    /// Watch channel over the merged, ordered message list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.store.subscribe()
    }

    /// Current merged message list.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.store.snapshot()
    }

    /// Handle for the booking workflow to report through this session.
    pub fn bot_sink(&self) -> BotSink {
        BotSink::new(self.store.clone(), self.bot_name.clone())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
