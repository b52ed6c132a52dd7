use std::collections::HashMap;
use std::sync::Mutex;

use crate::llm::models::Message;

/// Conversation history keyed by session.
pub trait SessionStore: Send + Sync {
    /// Snapshot of the history for `key`, oldest first. Unknown keys are empty.
    fn get(&self, key: &str) -> Vec<Message>;

    fn append(&self, key: &str, message: Message);
}

/// Process-local store. Histories are never evicted and vanish on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, key: &str) -> bool {
        self.len(key) == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Message>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Vec<Message> {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    fn append(&self, key: &str, message: Message) {
        self.lock().entry(key.to_string()).or_default().push(message);
    }
}
