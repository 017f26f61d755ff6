//! Application layer of the patient simulator.
//!
//! [`ChatManager`] owns the in-memory session store and runs each turn
//! through prompt building, generation and sanitization.

pub mod chat_manager;
mod session_store;
pub mod types;

pub use chat_manager::ChatManager;
pub use types::{GlobalStatistics, PathologyInfo, ServiceStatus, TurnReply};
