//! Post-generation output sanitization.

use super::config::{DiagnosisMatching, MIN_RESPONSE_LENGTH, SafetyConfig};
use super::patterns::{
    CHARACTER_BREAK_PATTERNS, COMMON_WORDS, matches_any, split_sentences,
};
use super::types::{SanitizedResult, ViolationKind};
use crate::error::{AresError, Result};
use crate::pathology::PathologyProfile;
use regex::{Regex, RegexBuilder};

const ELLIPSIS: &str = "...";
const MIN_TOKEN_CHARS: usize = 6;

/// Cleans raw model output before it reaches the caller.
///
/// `sanitize` is pure and never fails: every problem is either corrected in
/// place or reported as a [`ViolationKind`]. Whether a violation is fatal is
/// the caller's decision.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    config: SafetyConfig,
    blocked: Vec<Regex>,
}

impl Sanitizer {
    /// Compiles the denylist from `config`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `max_response_length` is below
    /// [`MIN_RESPONSE_LENGTH`] or a blocked phrase cannot be compiled into a
    /// matcher.
    pub fn new(config: SafetyConfig) -> Result<Self> {
        if config.max_response_length < MIN_RESPONSE_LENGTH {
            return Err(AresError::config(format!(
                "max_response_length must be at least {MIN_RESPONSE_LENGTH}, got {}",
                config.max_response_length
            )));
        }
        let blocked = config
            .blocked_phrases
            .iter()
            .map(|phrase| phrase.trim())
            .filter(|phrase| !phrase.is_empty())
            .map(phrase_matcher)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, blocked })
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    /// Runs the sanitization stages in order: truncate, strip blocked
    /// sentences, redact diagnosis mentions, flag character breaks, then
    /// check that something meaningful is left.
    pub fn sanitize(&self, raw: &str, profile: &PathologyProfile) -> SanitizedResult {
        let mut result = SanitizedResult {
            text: raw.trim().to_string(),
            ..SanitizedResult::default()
        };

        if let Some(cut) = truncate(&result.text, self.config.max_response_length) {
            result.text = cut;
            result.violations.insert(ViolationKind::Truncated);
        }

        if let Some(stripped) = self.strip_blocked(&result.text) {
            result.text = stripped;
            result.violations.insert(ViolationKind::BlockedPhrase);
        }

        let terms = leak_terms(profile, self.config.diagnosis_matching);
        if let Some(redacted) = redact(&result.text, &terms, &self.config.redaction_marker) {
            result.text = redacted;
            result.violations.insert(ViolationKind::DiagnosisLeak);
        }

        if matches_any(&CHARACTER_BREAK_PATTERNS, &result.text) {
            result.violations.insert(ViolationKind::CharacterBreak);
        }

        if !result.text.chars().any(char::is_alphanumeric) {
            result.violations.insert(ViolationKind::EmptyOutput);
        }

        result
    }

    /// Warning attached to replies once a conversation grows long.
    pub fn conversation_length_warning(&self, message_count: usize) -> Option<String> {
        (message_count >= self.config.max_conversation_turns).then(|| {
            format!(
                "Conversation has reached {message_count} messages. \
                 Consider starting a new session for accurate simulation."
            )
        })
    }

    fn strip_blocked(&self, text: &str) -> Option<String> {
        let sentences = split_sentences(text);
        let kept: Vec<&str> = sentences
            .iter()
            .copied()
            .filter(|sentence| !matches_any(&self.blocked, sentence))
            .collect();

        (kept.len() != sentences.len()).then(|| kept.concat().trim().to_string())
    }
}

fn phrase_matcher(phrase: &str) -> Result<Regex> {
    let word_edge = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let prefix = if word_edge(phrase.chars().next()) { r"\b" } else { "" };
    let suffix = if word_edge(phrase.chars().last()) { r"\b" } else { "" };

    RegexBuilder::new(&format!("{prefix}{}{suffix}", regex::escape(phrase)))
        .case_insensitive(true)
        .build()
        .map_err(|e| AresError::config(format!("invalid blocked phrase '{phrase}': {e}")))
}

fn prefix_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Cuts `text` to at most `cap` characters, or returns `None` if it fits.
///
/// Prefers ending on the last complete sentence when that keeps at least
/// half of the cap; otherwise cuts at the last whitespace and appends an
/// ellipsis.
fn truncate(text: &str, cap: usize) -> Option<String> {
    if text.chars().count() <= cap {
        return None;
    }

    let window = prefix_chars(text, cap);
    let sentence_end = window
        .char_indices()
        .filter(|&(index, c)| {
            matches!(c, '.' | '!' | '?')
                && text[index + c.len_utf8()..].starts_with(char::is_whitespace)
        })
        .map(|(index, c)| index + c.len_utf8())
        .last();

    if let Some(end) = sentence_end {
        if window[..end].chars().count() >= cap / 2 {
            return Some(window[..end].trim_end().to_string());
        }
    }

    let window = prefix_chars(text, cap.saturating_sub(ELLIPSIS.len()));
    let cut = window.rfind(char::is_whitespace).unwrap_or(window.len());
    Some(format!("{}{ELLIPSIS}", window[..cut].trim_end()))
}

/// Terms whose presence counts as a leak, longest first so that the most
/// specific match wins.
fn leak_terms(profile: &PathologyProfile, matching: DiagnosisMatching) -> Vec<String> {
    let mut terms: Vec<String> = profile
        .leak_terms()
        .map(|term| term.trim().to_string())
        .collect();

    if matching == DiagnosisMatching::Tokens {
        let words: Vec<String> = profile
            .leak_terms()
            .flat_map(|term| term.split(|c: char| !c.is_alphanumeric()))
            .filter(|word| word.chars().count() >= MIN_TOKEN_CHARS)
            .filter(|word| !COMMON_WORDS.contains(&word.to_lowercase().as_str()))
            .map(str::to_string)
            .collect();
        terms.extend(words);
    }

    terms.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });
    terms.dedup_by(|a, b| a.to_lowercase() == b.to_lowercase());
    terms
}

/// Replaces every case-insensitive occurrence of any term with `marker`.
/// Returns `None` if nothing matched.
///
/// Case folding is Unicode-aware. Terms are tried in the given order, so
/// longer terms listed first win over their substrings.
fn redact(text: &str, terms: &[String], marker: &str) -> Option<String> {
    if terms.is_empty() {
        return None;
    }

    let alternation = terms
        .iter()
        .map(|term| regex::escape(term))
        .collect::<Vec<_>>()
        .join("|");
    let matcher = match RegexBuilder::new(&alternation).case_insensitive(true).build() {
        Ok(matcher) => matcher,
        // Withhold the whole reply rather than risk a leak.
        Err(_) => return Some(marker.to_string()),
    };

    if !matcher.is_match(text) {
        return None;
    }
    Some(matcher.replace_all(text, regex::NoExpand(marker)).into_owned())
}
