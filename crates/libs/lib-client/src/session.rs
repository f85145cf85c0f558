//! # Conversation Session State
//!
//! Explicit conversation state passed into relay calls, with persistence
//! behind an injected key-value storage interface. Nothing here is a
//! module global: a caller owns its [`ConversationState`] and decides
//! where (or whether) it is persisted.

use serde::{Deserialize, Serialize};
use shared::dto::ChatTurn;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Key-value storage for serialized conversation state.
///
/// `set` overwrites; both operations are infallible from the caller's
/// point of view. A storage backend that can fail should log and degrade
/// to in-memory behavior, since losing session history is not an error
/// the chat flow can act on.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store, also the test double.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }
}

/// One conversation's state: an opaque session id plus a bounded turn list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    turns: Vec<ChatTurn>,
    max_turns: usize,
}

impl ConversationState {
    /// Start a fresh conversation with a random session id.
    pub fn new(max_turns: usize) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// All retained turns, oldest first. This is what gets sent as
    /// `conversation_history`.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::assistant(content));
    }

    fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
        while self.turns.len() > self.max_turns {
            self.turns.remove(0);
        }
    }

    /// Storage key under which this conversation persists.
    pub fn storage_key(&self) -> String {
        format!("chat_session:{}", self.session_id)
    }

    /// Persist into the given store.
    pub fn save(&self, store: &dyn SessionStore) {
        match serde_json::to_string(self) {
            Ok(json) => store.set(&self.storage_key(), &json),
            Err(err) => tracing::warn!(error = %err, "Failed to serialize conversation state"),
        }
    }

    /// Load a previously saved conversation, if present and readable.
    pub fn load(store: &dyn SessionStore, session_id: &str) -> Option<Self> {
        let json = store.get(&format!("chat_session:{}", session_id))?;
        match serde_json::from_str(&json) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!(error = %err, "Discarding unreadable conversation state");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::dto::ChatRole;

    #[test]
    fn turns_are_bounded_oldest_dropped_first() {
        let mut state = ConversationState::new(3);
        state.push_user("one");
        state.push_assistant("two");
        state.push_user("three");
        state.push_assistant("four");

        let contents: Vec<&str> = state.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three", "four"]);
    }

    #[test]
    fn roles_alternate_as_pushed() {
        let mut state = ConversationState::new(10);
        state.push_user("q");
        state.push_assistant("a");
        assert_eq!(state.turns()[0].role, ChatRole::User);
        assert_eq!(state.turns()[1].role, ChatRole::Assistant);
    }

    #[test]
    fn save_and_load_round_trip() {
        let store = InMemorySessionStore::new();
        let mut state = ConversationState::new(5);
        state.push_user("hello");
        state.save(&store);

        let loaded = ConversationState::load(&store, &state.session_id).expect("state saved");
        assert_eq!(loaded.session_id, state.session_id);
        assert_eq!(loaded.turns(), state.turns());
    }

    #[test]
    fn load_missing_session_is_none() {
        let store = InMemorySessionStore::new();
        assert!(ConversationState::load(&store, "nope").is_none());
    }

    #[test]
    fn load_corrupt_state_is_none() {
        let store = InMemorySessionStore::new();
        store.set("chat_session:bad", "{not json");
        assert!(ConversationState::load(&store, "bad").is_none());
    }
}
