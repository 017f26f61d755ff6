//! Session domain module.
//!
//! - `message`: conversation message types (`MessageRole`, `ChatMessage`)
//! - `model`: the session aggregate (`ChatSession`) and its read-only views

mod message;
mod model;

pub use message::{ChatMessage, ConversationPair, MessageRole};
pub use model::{ChatSession, SessionState, SessionStatistics, SessionSummary};
