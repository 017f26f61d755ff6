//! Chat manager configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What happens when a session reaches `max_messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the oldest whole turns after each successful turn.
    #[default]
    EvictOldest,
    /// Refuse new turns once the cap would be exceeded.
    Reject,
}

/// Which system prompt template to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PromptStyle {
    #[default]
    Full,
    /// Short prompt for small local models.
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Upper bound on messages per session, system message included.
    pub max_messages: usize,
    pub eviction: EvictionPolicy,
    pub generation_timeout_secs: u64,
    /// Idle time after which `cleanup_expired` removes a session.
    pub session_ttl_hours: u64,
    /// Seed for random pathology selection; `None` uses entropy.
    pub pathology_seed: Option<u64>,
    pub max_user_message_chars: usize,
    pub prompt_style: PromptStyle,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_messages: 100,
            eviction: EvictionPolicy::EvictOldest,
            generation_timeout_secs: 60,
            session_ttl_hours: 24,
            pathology_seed: None,
            max_user_message_chars: 2000,
            prompt_style: PromptStyle::Full,
        }
    }
}
