//! Canonical message list: a pure merge over source snapshots plus a watch
//! channel for subscribers.
//!
//! Concurrent appends need no locks beyond the snapshot mutex: every mutation
//! derives the next list from the latest known sources via [`merge`] instead
//! of patching shared structure in place, so interleaved completions still
//! render in `created_at` order.

use std::collections::HashSet;
use std::sync::Mutex;

use civi_core::ChatMessage;
use tokio::sync::watch;

/// Transient "searching…" message inserted optimistically for FAQ-category
/// turns and filtered out once the real reply or a fallback arrives.
pub const SEARCHING_PLACEHOLDER: &str = "⏳ Buscando información...";

/// Merges message source lists: concatenation, first-occurrence dedup by id,
/// then a stable sort by `(created_at, id)`. Pure and idempotent:
/// `merge(&[merge(sources)]) == merge(sources)`.
pub fn merge(sources: &[Vec<ChatMessage>]) -> Vec<ChatMessage> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ChatMessage> = Vec::new();
    for source in sources {
        for message in source {
            if seen.insert(message.id.clone()) {
                merged.push(message.clone());
            }
        }
    }
    merged.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
    merged
}

/// Owns the canonical merged message list for one chat session. Single
/// writer by convention: command handlers and the booking workflow hand
/// messages back to callers holding this store.
pub struct MessageStore {
    state: Mutex<Vec<ChatMessage>>,
    tx: watch::Sender<Vec<ChatMessage>>,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            state: Mutex::new(Vec::new()),
            tx,
        }
    }

    /// Seeds the store from existing source lists (e.g. messages injected by
    /// the embedding surface).
    pub fn with_sources(sources: &[Vec<ChatMessage>]) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap();
            *state = merge(sources);
            store.tx.send_replace(state.clone());
        }
        store
    }

    /// Appends one message, rebuilding the canonical list.
    pub fn push(&self, message: ChatMessage) {
        self.extend(vec![message]);
    }

    /// Appends a batch of messages, rebuilding the canonical list.
    pub fn extend(&self, messages: Vec<ChatMessage>) {
        let mut state = self.state.lock().unwrap();
        let next = merge(&[state.clone(), messages]);
        *state = next;
        self.tx.send_replace(state.clone());
    }

    /// Drops any leftover searching placeholder.
    pub fn clear_placeholder(&self) {
        let mut state = self.state.lock().unwrap();
        state.retain(|m| m.content != SEARCHING_PLACEHOLDER);
        self.tx.send_replace(state.clone());
    }

    /// Appends an error message after clearing any placeholder, unless the
    /// immediately preceding message already carries identical content — two
    /// failed sends in a row never show the same error twice.
    pub fn push_error(&self, message: ChatMessage) {
        let mut state = self.state.lock().unwrap();
        state.retain(|m| m.content != SEARCHING_PLACEHOLDER);
        let repeated = state
            .last()
            .map(|last| last.content == message.content)
            .unwrap_or(false);
        if !repeated {
            let next = merge(&[state.clone(), vec![message]]);
            *state = next;
        }
        self.tx.send_replace(state.clone());
    }

    /// Current merged list.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.state.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().is_empty()
    }

    /// Watch channel over the merged list; receivers see every rebuild.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatMessage>> {
        self.tx.subscribe()
    }
}
