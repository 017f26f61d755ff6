//! Root configuration document.

use ares_core::config::ChatConfig;
use ares_core::generation::GenerationParams;
use ares_core::pathology::{PathologyCatalog, PathologyProfile};
use ares_core::safety::{MIN_RESPONSE_LENGTH, SafetyConfig};
use ares_core::{AresError, Result};
use ares_interaction::EngineConfig;
use serde::{Deserialize, Serialize};

/// Ten years.
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365 * 10;

/// Everything the simulator reads from `config.toml`.
///
/// Every section is optional; missing values fall back to defaults.
///
/// ```toml
/// [engine]
/// kind = "local"
///
/// [engine.local]
/// model = "phi3.5"
///
/// [chat]
/// max_messages = 60
/// eviction = "reject"
///
/// [generation]
/// temperature = 0.4
///
/// [[pathology]]
/// key = "dry_socket"
/// label = "Alveolar Osteitis"
/// chief_complaint = "Severe pain a few days after an extraction."
/// diagnosis = "Alveolar Osteitis"
/// diagnosis_synonyms = ["dry socket"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AresConfig {
    pub engine: EngineConfig,
    pub chat: ChatConfig,
    /// Default generation parameters for turns that supply none.
    pub generation: GenerationParams,
    pub safety: SafetyConfig,
    /// Extra profiles; a key matching a built-in profile replaces it.
    #[serde(rename = "pathology", skip_serializing_if = "Vec::is_empty")]
    pub pathologies: Vec<PathologyProfile>,
}

impl AresConfig {
    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the offending section.
    pub fn validate(&self) -> Result<()> {
        self.generation
            .validate()
            .map_err(|e| AresError::config(format!("[generation] {e}")))?;

        if self.chat.max_messages < 3 {
            return Err(AresError::config("[chat] max_messages must be at least 3"));
        }
        if self.chat.max_user_message_chars == 0 {
            return Err(AresError::config("[chat] max_user_message_chars must be positive"));
        }
        if self.chat.generation_timeout_secs == 0 {
            return Err(AresError::config("[chat] generation_timeout_secs must be positive"));
        }
        if self.chat.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(AresError::config(format!(
                "[chat] session_ttl_hours must be at most {MAX_SESSION_TTL_HOURS}"
            )));
        }
        if self.safety.max_response_length < MIN_RESPONSE_LENGTH {
            return Err(AresError::config(format!(
                "[safety] max_response_length must be at least {MIN_RESPONSE_LENGTH}"
            )));
        }
        Ok(())
    }

    /// Built-in catalog merged with the configured profiles.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the merged catalog is invalid.
    pub fn catalog(&self) -> Result<PathologyCatalog> {
        if self.pathologies.is_empty() {
            return Ok(PathologyCatalog::builtin());
        }
        PathologyCatalog::builtin_with(self.pathologies.clone())
    }
}
