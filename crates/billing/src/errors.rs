//! Error types for the billing crate.

use ficecal_core::ContextError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::AdapterId;

/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Stable codes callers branch on after a failed ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestErrorCode {
    AuthError,
    PermissionError,
    RateLimit,
    Timeout,
    UpstreamUnavailable,
    ValidationError,
    UnknownRuntimeError,
}

impl IngestErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthError => "auth_error",
            Self::PermissionError => "permission_error",
            Self::RateLimit => "rate_limit",
            Self::Timeout => "timeout",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::ValidationError => "validation_error",
            Self::UnknownRuntimeError => "unknown_runtime_error",
        }
    }
}

impl fmt::Display for IngestErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the adapter registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Identity does not match `<name>-billing`
    #[error("Invalid adapter id format '{id}'. Expected '*-billing'.")]
    InvalidAdapterId { id: String },

    /// Registration would overwrite an existing adapter without override
    #[error("Billing adapter '{id}' is already registered.")]
    AlreadyRegistered { id: String },

    /// Identity could not be resolved under the active policy
    #[error("{message}")]
    Unresolved { requested: String, message: String },

    /// Fallback resolution points at an adapter that was never registered
    #[error("Fallback billing adapter '{fallback}' is not registered (requested '{requested}').")]
    FallbackNotRegistered { requested: String, fallback: String },
}

impl RegistryError {
    /// Whether this is the operational resolution failure rather than a configuration bug.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

/// Errors returned by adapters from the mapping stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Payload failed structural validation
    #[error("{}", .0.join(", "))]
    InvalidPayload(Vec<String>),

    /// Error that already carries an ingest code
    #[error("{message}")]
    Coded {
        code: IngestErrorCode,
        message: String,
    },

    /// Untyped runtime failure, classified from its message text
    #[error("{0}")]
    Runtime(String),
}

impl AdapterError {
    /// Create a coded error
    pub fn coded(code: IngestErrorCode, message: impl Into<String>) -> Self {
        Self::Coded {
            code,
            message: message.into(),
        }
    }

    /// Create an untyped runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    MissingVar(&'static str),

    #[error("Invalid value '{value}' for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors surfaced by the ingest orchestrator.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Classified operational failure; telemetry was emitted before returning
    #[error("Billing ingest failed for {adapter_id} ({code}): {message}")]
    Failed {
        code: IngestErrorCode,
        adapter_id: AdapterId,
        message: String,
    },

    /// Registry misconfiguration; propagated unclassified
    #[error("Billing configuration error: {0}")]
    Configuration(#[from] RegistryError),

    /// Envelope rejected before adapter resolution
    #[error(transparent)]
    Context(#[from] ContextError),
}

impl IngestError {
    /// Create a classified ingest failure
    pub fn failed(code: IngestErrorCode, adapter_id: AdapterId, message: impl Into<String>) -> Self {
        Self::Failed {
            code,
            adapter_id,
            message: message.into(),
        }
    }

    /// Stable code if this is a classified failure.
    pub fn code(&self) -> Option<IngestErrorCode> {
        match self {
            Self::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Adapter the failure is attributed to.
    pub fn adapter_id(&self) -> Option<&AdapterId> {
        match self {
            Self::Failed { adapter_id, .. } => Some(adapter_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_serialize_snake_case() {
        let json = serde_json::to_string(&IngestErrorCode::UpstreamUnavailable).unwrap();
        assert_eq!(json, "\"upstream_unavailable\"");
        assert_eq!(IngestErrorCode::RateLimit.as_str(), "rate_limit");
    }

    #[test]
    fn failed_error_message_is_prefixed_with_adapter() {
        let err = IngestError::failed(
            IngestErrorCode::Timeout,
            AdapterId::builtin("aws-billing"),
            "upstream took too long",
        );
        assert_eq!(err.code(), Some(IngestErrorCode::Timeout));
        assert_eq!(err.adapter_id().map(AdapterId::as_str), Some("aws-billing"));
        assert!(err.to_string().starts_with("Billing ingest failed for aws-billing"));
    }

    #[test]
    fn invalid_payload_joins_messages() {
        let err = AdapterError::InvalidPayload(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "a, b");
    }

    #[test]
    fn only_unresolved_is_resolution_error() {
        let unresolved = RegistryError::Unresolved {
            requested: "x-billing".into(),
            message: "nope".into(),
        };
        assert!(unresolved.is_resolution_error());
        let fallback = RegistryError::FallbackNotRegistered {
            requested: "x-billing".into(),
            fallback: "y-billing".into(),
        };
        assert!(!fallback.is_resolution_error());
    }
}
