//! Regex patterns and text helpers shared by the sanitizer and validator.

use regex::Regex;
use std::sync::LazyLock;

/// Role-breaking phrasing: AI self-reference, disclaimers, assistant tone.
pub(crate) static CHARACTER_BREAK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\bas an? (?:ai|artificial intelligence)\b",
        r"(?i)\b(?:language model|chatbot|virtual assistant)\b",
        r"(?i)\bI(?:'m| am) (?:an? )?(?:ai|bot|assistant|simulation|simulated patient)\b",
        r"(?i)\bI(?:'m| am) not a (?:doctor|dentist|medical professional)\b",
        r"(?i)\bI (?:cannot|can't|can not) (?:provide|give|offer) medical\b",
        r"(?i)\bI don't have access to\b",
        r"(?i)\bI'd be (?:happy|glad) to help\b",
        r"(?i)\bhere are (?:some|a few) (?:tips|suggestions|steps)\b",
        r"(?i)\bas your (?:assistant|ai)\b",
        r"(?i)\bhow (?:can|may) I (?:help|assist) you\b",
    ])
});

/// Phrasing that hands the caller a diagnosis.
pub(crate) static DISCLOSURE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\byou have (?:[a-z]+ ){1,3}(?:disease|condition|syndrome|disorder)\b",
        r"(?i)\bthis is (?:likely|probably|definitely) (?:[a-z]+ ){1,3}",
        r"(?i)\bI (?:think|believe) you have\b",
    ])
});

/// Words too generic to count as a diagnosis leak on their own.
pub(crate) const COMMON_WORDS: &[&str] = &[
    "simple",
    "chronic",
    "involvement",
    "reversible",
    "irreversible",
    "partial",
    "general",
    "severe",
    "inflammation",
    "infection",
    "lesion",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
}

pub(crate) fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(text))
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Splits text into sentences, each keeping its terminator and trailing
/// whitespace so that concatenating the pieces restores the input.
///
/// A boundary is a run of `.`, `!` or `?` (optionally followed by closing
/// quotes or brackets) followed by whitespace or the end of text, or a line
/// break.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        let boundary = if c == '\n' {
            true
        } else if is_terminator(c) {
            while let Some(&(_, next)) = chars.peek() {
                if is_terminator(next) || matches!(next, '"' | '\'' | ')' | ']') {
                    chars.next();
                } else {
                    break;
                }
            }
            chars.peek().is_none_or(|&(_, next)| next.is_whitespace())
        } else {
            false
        };

        if boundary {
            let mut end = index + c.len_utf8();
            while let Some(&(next_index, next)) = chars.peek() {
                if next.is_whitespace() {
                    end = next_index + next.len_utf8();
                    chars.next();
                } else {
                    end = next_index;
                    break;
                }
            }
            if chars.peek().is_none() {
                end = text.len();
            }
            sentences.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}
