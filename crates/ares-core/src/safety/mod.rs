//! Output safety for the simulated patient.
//!
//! - `sanitizer`: the correcting pipeline applied to every raw reply
//! - `validator`: advisory quality checks, logged but never enforced

mod config;
mod patterns;
mod sanitizer;
mod types;
mod validator;

pub use config::{DEFAULT_BLOCKED_PHRASES, DiagnosisMatching, MIN_RESPONSE_LENGTH, SafetyConfig};
pub use sanitizer::Sanitizer;
pub use types::{SanitizedResult, ViolationKind};
pub use validator::{QualityIssue, ResponseValidator};
