//! Advisory quality checks on sanitized replies.

use super::patterns::{CHARACTER_BREAK_PATTERNS, DISCLOSURE_PATTERNS, matches_any};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::Display;

const MIN_REPLY_CHARS: usize = 5;
const REPETITION_MIN_WORDS: usize = 10;
const MIN_UNIQUE_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QualityIssue {
    /// Reply refers to itself as an AI or slips into assistant tone.
    MetaReference,
    /// Reply hands the caller a diagnosis.
    DiagnosisDisclosure,
    TooShort,
    ExcessiveRepetition,
}

impl QualityIssue {
    pub fn description(&self) -> &'static str {
        match self {
            Self::MetaReference => "reply may have broken character (meta-reference detected)",
            Self::DiagnosisDisclosure => "possible diagnosis disclosure detected",
            Self::TooShort => "reply is too short",
            Self::ExcessiveRepetition => "reply contains excessive repetition",
        }
    }
}

/// Reports quality problems without changing the reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Returns every issue found, in a fixed order. Empty means the reply
    /// looks fine.
    pub fn validate(&self, response: &str) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        if matches_any(&CHARACTER_BREAK_PATTERNS, response) {
            issues.push(QualityIssue::MetaReference);
        }
        if matches_any(&DISCLOSURE_PATTERNS, response) {
            issues.push(QualityIssue::DiagnosisDisclosure);
        }
        if response.trim().chars().count() < MIN_REPLY_CHARS {
            issues.push(QualityIssue::TooShort);
        }

        let lowered = response.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.len() > REPETITION_MIN_WORDS {
            let unique: HashSet<&str> = words.iter().copied().collect();
            if (unique.len() as f64) < words.len() as f64 * MIN_UNIQUE_RATIO {
                issues.push(QualityIssue::ExcessiveRepetition);
            }
        }

        issues
    }
}
