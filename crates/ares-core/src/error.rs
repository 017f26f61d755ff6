//! Error types for the Ares patient simulator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Ares workspace.
///
/// Client-side failures (`NotFound`, `InvalidPathology`, `InvalidArgument`,
/// `ConversationLimitReached`) are distinguished from generation failures
/// (`ModelNotLoaded`, `GenerationFailure`, `RateLimited`) so that outer layers
/// can map them to the right response without inspecting messages.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AresError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Unknown pathology key supplied at session creation
    #[error("'{key}' is not a valid pathology (valid options: {})", .valid_options.join(", "))]
    InvalidPathology {
        key: String,
        valid_options: Vec<String>,
    },

    /// Out-of-range or malformed argument rejected before dispatch
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    /// Session reached its message cap under the reject policy
    #[error("Session '{session_id}' reached its limit of {max_messages} messages")]
    ConversationLimitReached {
        session_id: String,
        max_messages: usize,
    },

    /// Generation backend is absent, uninitialized or still loading
    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Timeout, runtime or network failure while generating
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// Remote backend throttling
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AresError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an InvalidArgument error
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a ModelNotLoaded error
    pub fn model_not_loaded(message: impl Into<String>) -> Self {
        Self::ModelNotLoaded(message.into())
    }

    /// Creates a GenerationFailure error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailure(message.into())
    }

    /// Creates a RateLimited error
    pub fn rate_limited(message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_secs,
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a ModelNotLoaded error
    pub fn is_model_not_loaded(&self) -> bool {
        matches!(self, Self::ModelNotLoaded(_))
    }

    /// Check if this is a GenerationFailure error
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::GenerationFailure(_))
    }

    /// Check if this is a RateLimited error
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true for errors caused by the caller's input.
    ///
    /// Outer layers surface these as client errors; everything else is a
    /// server-side condition.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidPathology { .. }
                | Self::InvalidArgument { .. }
                | Self::ConversationLimitReached { .. }
        )
    }

    /// Returns true for failures raised by a generation backend.
    ///
    /// A turn that fails with one of these is rolled back by the chat manager.
    pub fn is_generation_error(&self) -> bool {
        matches!(
            self,
            Self::ModelNotLoaded(_) | Self::GenerationFailure(_) | Self::RateLimited { .. }
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AresError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AresError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AresError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<minijinja::Error> for AresError {
    fn from(err: minijinja::Error) -> Self {
        Self::Internal(format!("prompt template error: {err}"))
    }
}

/// A type alias for `Result<T, AresError>`.
pub type Result<T> = std::result::Result<T, AresError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = AresError::not_found("session", "abc");
        assert_eq!(err.to_string(), "Entity not found: session 'abc'");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_invalid_pathology_lists_options() {
        let err = AresError::InvalidPathology {
            key: "flu".to_string(),
            valid_options: vec!["dental_caries".to_string(), "pericoronitis".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("'flu'"));
        assert!(message.contains("dental_caries, pericoronitis"));
    }

    #[test]
    fn test_generation_errors_are_not_client_errors() {
        let errors = [
            AresError::model_not_loaded("loading"),
            AresError::generation("timeout"),
            AresError::rate_limited("slow down", Some(30)),
        ];
        for err in errors {
            assert!(err.is_generation_error());
            assert!(!err.is_client_error());
        }
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AresError = io.into();
        match err {
            AresError::Io { message } => assert!(message.contains("NotFound")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
