//! Error types for the core crate.

use thiserror::Error;

/// Result type alias for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors raised while validating a tool envelope.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A required context field is missing or empty
    #[error("Invalid request context: {0}")]
    Invalid(String),

    /// The envelope JSON does not have the expected shape
    #[error("Malformed tool envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ContextError {
    /// Create an invalid context error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
