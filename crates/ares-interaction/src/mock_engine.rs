//! Deterministic engine for tests and offline use.

use ares_core::Result;
use ares_core::generation::{GenerationRequest, PatientEngine};
use async_trait::async_trait;

const PAIN_REPLIES: &[&str] = &[
    "The pain is sharp and throbbing, mostly in my lower right side.",
    "It hurts a lot, especially when I bite down on something.",
    "The pain comes and goes, but it's been getting worse lately.",
    "It's a dull ache that sometimes becomes very intense.",
];

const LOCATION_REPLIES: &[&str] = &[
    "It's in my back teeth, on the right side.",
    "The pain seems to be coming from one of my molars.",
    "I think it's the tooth second from the back, lower jaw.",
    "It's hard to tell exactly, but somewhere in the back of my mouth.",
];

const DURATION_REPLIES: &[&str] = &[
    "It started about three days ago.",
    "I've been having this problem for about a week now.",
    "The pain began suddenly yesterday morning.",
    "It's been bothering me on and off for a few weeks.",
];

const TRIGGER_REPLIES: &[&str] = &[
    "Cold drinks make it much worse.",
    "It hurts when I eat anything sweet.",
    "Biting down on hard food triggers the pain.",
    "Hot coffee seems to set it off.",
];

const DEFAULT_REPLIES: &[&str] = &[
    "I'm not sure how to describe it, but it's quite uncomfortable.",
    "Can you explain what you mean? I'm just here because my tooth hurts.",
    "I've never had dental problems like this before.",
    "I just want to find out what's wrong and get some relief.",
    "Is this something serious, doctor?",
];

/// Keyword lists checked in order; the first category with a hit wins.
const CATEGORIES: &[(&[&str], &[&str])] = &[
    (&["pain", "hurt", "ache", "sore"], PAIN_REPLIES),
    (&["where", "location", "which tooth", "side"], LOCATION_REPLIES),
    (&["when", "how long", "start", "began", "duration"], DURATION_REPLIES),
    (&["trigger", "worse", "cause", "cold", "hot", "sweet"], TRIGGER_REPLIES),
];

/// Answers from canned lay-language lines chosen by the topic of the last
/// user turn. The same question always gets the same answer, and the engine
/// never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPatientEngine;

impl MockPatientEngine {
    pub fn new() -> Self {
        Self
    }

    /// Picks the reply for a user message.
    pub fn reply_for(message: &str) -> &'static str {
        let lowered = message.to_lowercase();
        let replies = CATEGORIES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(_, replies)| *replies)
            .unwrap_or(DEFAULT_REPLIES);

        let index = (stable_hash(&lowered) % replies.len() as u64) as usize;
        replies[index]
    }
}

/// FNV-1a; stable across runs and platforms, unlike `DefaultHasher`.
fn stable_hash(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl PatientEngine for MockPatientEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let message = request.prompt.last_user_message().unwrap_or_default();
        Ok(Self::reply_for(message).to_string())
    }
}
