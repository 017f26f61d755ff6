//! Chat session domain model.

use super::message::{ChatMessage, ConversationPair, MessageRole};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Lifecycle position of a session. Deletion is terminal and is represented
/// by the session leaving the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Only the system message exists; no turn has completed yet.
    Created,
    /// At least one turn completed since creation or the last reset.
    Active,
    /// History was truncated back to the system message.
    Reset,
}

/// A simulated-patient conversation.
///
/// The first message is always the single system message derived from the
/// pathology profile. History is append-only apart from three controlled
/// operations: rolling back a tentative user turn, evicting whole turns from
/// the front, and resetting to the system message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub pathology_key: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Creates a session with a fresh UUID and exactly one system message.
    pub fn new(pathology_key: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            pathology_key: pathology_key.into(),
            state: SessionState::Created,
            created_at: now,
            updated_at: now,
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    /// Full ordered history, system message first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn system_message(&self) -> &ChatMessage {
        &self.messages[0]
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if appending `additional` messages would exceed `max`.
    pub fn would_exceed(&self, max: usize, additional: usize) -> bool {
        self.messages.len() + additional > max
    }

    /// Appends a user message that is not yet committed.
    ///
    /// `updated_at` is left untouched so that a rollback restores the session
    /// exactly.
    pub fn push_tentative_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Removes the tentative user message appended for a failed turn.
    ///
    /// The message is only removed if it is the last entry, has the user
    /// role, carries `expected` as content and is not the system message.
    /// Returns false (and leaves history alone) otherwise.
    pub fn rollback_tentative_user(&mut self, expected: &str) -> bool {
        let removable = self.messages.len() > 1
            && self
                .messages
                .last()
                .is_some_and(|last| last.role == MessageRole::User && last.content == expected);

        if removable {
            self.messages.pop();
        }
        removable
    }

    /// Commits a turn by appending the patient reply.
    pub fn commit_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
        self.state = SessionState::Active;
        self.touch();
    }

    /// Drops whole turns from the front (after the system message) until the
    /// history holds at most `max_messages` entries.
    ///
    /// A user message is removed together with the assistant reply that
    /// follows it, so history never starts with an orphaned reply. Returns the
    /// number of removed messages.
    pub fn evict_oldest_turns(&mut self, max_messages: usize) -> usize {
        let mut removed = 0;
        while self.messages.len() > max_messages.max(1) && self.messages.len() > 1 {
            self.messages.remove(1);
            removed += 1;
            if self.messages.len() > 1 && self.messages[1].role == MessageRole::Assistant {
                self.messages.remove(1);
                removed += 1;
            }
        }
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Truncates history back to the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        self.state = SessionState::Reset;
        self.touch();
    }

    pub fn user_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role == MessageRole::User)
    }

    pub fn assistant_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
    }

    /// The conversation as user/assistant pairs, skipping unanswered messages.
    pub fn conversation_pairs(&self) -> Vec<ConversationPair> {
        let mut pairs = Vec::new();
        let mut pending_user: Option<&str> = None;
        for message in &self.messages {
            match message.role {
                MessageRole::User => pending_user = Some(&message.content),
                MessageRole::Assistant => {
                    if let Some(user) = pending_user.take() {
                        pairs.push(ConversationPair {
                            user: user.to_string(),
                            assistant: message.content.clone(),
                        });
                    }
                }
                MessageRole::System => {}
            }
        }
        pairs
    }

    /// Returns true if the session has been idle for longer than `ttl`.
    ///
    /// A deadline past the representable range never expires.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.updated_at
            .checked_add_signed(ttl)
            .is_some_and(|deadline| now > deadline)
    }

    pub fn statistics(&self, max_messages: usize) -> SessionStatistics {
        let user_lengths: Vec<usize> = self
            .user_messages()
            .map(|m| m.content.chars().count())
            .collect();
        let assistant_lengths: Vec<usize> = self
            .assistant_messages()
            .map(|m| m.content.chars().count())
            .collect();

        SessionStatistics {
            total_messages: self.messages.len(),
            user_messages: user_lengths.len(),
            assistant_messages: assistant_lengths.len(),
            avg_user_length: average(&user_lengths),
            avg_assistant_length: average(&assistant_lengths),
            duration_minutes: (self.updated_at - self.created_at).num_seconds() as f64 / 60.0,
            is_at_limit: self.messages.len() >= max_messages,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            pathology_key: self.pathology_key.clone(),
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn average(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
}

/// Metadata view of a session used for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub pathology_key: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Per-session conversation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub avg_user_length: f64,
    pub avg_assistant_length: f64,
    pub duration_minutes: f64,
    pub is_at_limit: bool,
}
