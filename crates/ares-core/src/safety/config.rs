//! Safety sanitizer configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Phrases removed from replies (whole sentence) wherever they appear.
/// Smallest reply cap that still leaves room for text before the ellipsis.
pub const MIN_RESPONSE_LENGTH: usize = 10;

pub const DEFAULT_BLOCKED_PHRASES: &[&str] = &[
    "As an AI language model",
    "As an AI",
    "as a language model",
    "I diagnose",
    "My diagnosis is",
    "The diagnosis is",
    "I prescribe",
    "Take this medication",
    "You should take",
    "I recommend you take",
];

/// How aggressively diagnosis leaks are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiagnosisMatching {
    /// Case-insensitive substring match of the diagnosis and its synonyms.
    #[default]
    Exact,
    /// `Exact` plus distinctive single words taken from those terms.
    Tokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Hard cap on reply length, in characters.
    pub max_response_length: usize,
    pub blocked_phrases: Vec<String>,
    pub diagnosis_matching: DiagnosisMatching,
    /// Text substituted for each redacted diagnosis mention.
    pub redaction_marker: String,
    /// Message count at which a length warning is attached to replies.
    pub max_conversation_turns: usize,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_response_length: 1000,
            blocked_phrases: DEFAULT_BLOCKED_PHRASES
                .iter()
                .map(|phrase| phrase.to_string())
                .collect(),
            diagnosis_matching: DiagnosisMatching::Exact,
            redaction_marker: "...".to_string(),
            max_conversation_turns: 50,
        }
    }
}
