//! Pathology profile domain model.

use serde::{Deserialize, Serialize};

/// One answer the simulated patient knows about a symptom category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomFact {
    /// Question category this fact answers (e.g. "pain", "location").
    pub category: String,
    /// What the patient knows, phrased as a clinical note.
    pub answer: String,
}

impl SymptomFact {
    pub fn new(category: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            answer: answer.into(),
        }
    }
}

/// Static description of a simulated dental condition.
///
/// Profiles are loaded once at process start and are read-only afterwards.
/// `diagnosis` and `diagnosis_synonyms` seed the hidden part of the system
/// prompt and the leak detector; they must never reach the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathologyProfile {
    /// Unique, stable identifier (snake_case).
    pub key: String,
    /// Human-readable clinical label.
    pub label: String,
    /// What the patient would say brought them in.
    pub chief_complaint: String,
    /// Symptom facts in presentation order.
    #[serde(default)]
    pub symptoms: Vec<SymptomFact>,
    /// The diagnosis string the patient must never reveal.
    pub diagnosis: String,
    /// Other spellings or names of the diagnosis that count as a leak.
    #[serde(default)]
    pub diagnosis_synonyms: Vec<String>,
}

impl PathologyProfile {
    /// Returns the answer recorded for a symptom category, if any.
    pub fn symptom(&self, category: &str) -> Option<&str> {
        self.symptoms
            .iter()
            .find(|fact| fact.category.eq_ignore_ascii_case(category))
            .map(|fact| fact.answer.as_str())
    }

    /// Diagnosis followed by its synonyms, skipping blanks.
    pub fn leak_terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.diagnosis.as_str())
            .chain(self.diagnosis_synonyms.iter().map(String::as_str))
            .filter(|term| !term.trim().is_empty())
    }
}
