use ares_core::session::ChatSession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Per-session slot. `None` means the session was deleted while a caller
/// was waiting on the lock.
pub(crate) type SessionCell = Arc<Mutex<Option<ChatSession>>>;

/// In-memory map from session ID to its lockable slot.
///
/// The map lock is only held long enough to look up, insert or remove a
/// slot; it is never held while waiting on a session lock, so unrelated
/// sessions never block each other.
#[derive(Default)]
pub(crate) struct SessionStore {
    sessions: RwLock<HashMap<String, SessionCell>>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get(&self, session_id: &str) -> Option<SessionCell> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    pub(crate) async fn insert(&self, session: ChatSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), Arc::new(Mutex::new(Some(session))));
    }

    pub(crate) async fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    /// All slots, cloned out so callers can lock them without holding the
    /// map lock.
    pub(crate) async fn snapshot(&self) -> Vec<SessionCell> {
        let sessions = self.sessions.read().await;
        sessions.values().cloned().collect()
    }

    pub(crate) async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
