//! Sanitizer result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::Display;

/// A problem found (and, where possible, corrected) in raw model output.
///
/// Ordering follows the pipeline stage that reports the violation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViolationKind {
    /// Output exceeded the length cap and was cut.
    Truncated,
    /// One or more sentences contained a denylisted phrase and were removed.
    BlockedPhrase,
    /// The diagnosis or a synonym appeared and was redacted.
    DiagnosisLeak,
    /// The text reads as an assistant rather than a patient. Flag only.
    CharacterBreak,
    /// Nothing meaningful survived sanitization.
    EmptyOutput,
}

/// Cleaned text plus every violation observed on the way.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SanitizedResult {
    pub text: String,
    pub violations: BTreeSet<ViolationKind>,
}

impl SanitizedResult {
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.contains(&kind)
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns true when the reply must not be delivered.
    pub fn is_empty_output(&self) -> bool {
        self.has(ViolationKind::EmptyOutput)
    }
}
