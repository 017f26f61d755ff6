//! The generation engine capability.

use super::params::GenerationParams;
use crate::error::Result;
use crate::prompt::Prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A validated request for the next patient utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: Prompt,
    pub params: GenerationParams,
}

impl GenerationRequest {
    /// Builds a request after checking the parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if any parameter is out of range.
    pub fn new(prompt: Prompt, params: GenerationParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { prompt, params })
    }
}

/// Produces the next patient utterance for a prompt.
///
/// Implementations are selected once at startup and shared behind an
/// `Arc<dyn PatientEngine>`; nothing downstream inspects the concrete type.
///
/// # Errors
///
/// `generate` may fail with `ModelNotLoaded`, `GenerationFailure` or
/// `RateLimited`. The chat manager rolls the turn back on any of them.
#[async_trait]
pub trait PatientEngine: Send + Sync {
    /// Short identifier used in logs and status output.
    fn name(&self) -> &str;

    /// Generates raw, unsanitized text for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
