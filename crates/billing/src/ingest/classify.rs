//! Maps adapter failures onto stable ingest error codes.

use crate::errors::{AdapterError, IngestErrorCode};

/// Code for a failed payload validation, judged from the accumulated messages.
pub fn infer_validation_code(errors: &[String]) -> IngestErrorCode {
    let combined = errors.join(" ").to_lowercase();
    if combined.contains("authmode") || combined.contains("credentialref") {
        IngestErrorCode::AuthError
    } else if combined.contains("permission") {
        IngestErrorCode::PermissionError
    } else {
        IngestErrorCode::ValidationError
    }
}

/// Keyword heuristic for untyped runtime failures. First matching family wins.
pub fn classify_runtime_message(message: &str) -> IngestErrorCode {
    let lowered = message.to_lowercase();
    let has = |needle: &str| lowered.contains(needle);

    if has("auth") || has("credential") {
        IngestErrorCode::AuthError
    } else if has("permission") || has("forbidden") {
        IngestErrorCode::PermissionError
    } else if has("rate") && has("limit") {
        IngestErrorCode::RateLimit
    } else if has("timeout") {
        IngestErrorCode::Timeout
    } else if has("unavailable") || has("upstream") {
        IngestErrorCode::UpstreamUnavailable
    } else if has("invalid") || has("validation") {
        IngestErrorCode::ValidationError
    } else {
        IngestErrorCode::UnknownRuntimeError
    }
}

/// Only [`AdapterError::Runtime`] goes through the keyword heuristic.
pub fn classify_adapter_error(error: &AdapterError) -> IngestErrorCode {
    match error {
        AdapterError::InvalidPayload(errors) => infer_validation_code(errors),
        AdapterError::Coded { code, .. } => *code,
        AdapterError::Runtime(message) => classify_runtime_message(message),
    }
}
