//! Structural checks applied to a context before any tool runs.

use serde::de::DeserializeOwned;

use super::model::{RequestContext, ToolEnvelope};
use crate::errors::{ContextError, Result};

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Checks correlation ids, the time range and the contract-version triple.
pub fn validate_context(context: &RequestContext) -> Result<()> {
    if is_blank(&context.request_id) || is_blank(&context.trace_id) {
        return Err(ContextError::invalid("requestId and traceId are required"));
    }
    if is_blank(&context.workspace_id) {
        return Err(ContextError::invalid("workspaceId is required"));
    }

    let range = &context.time_range;
    if is_blank(&range.start) || is_blank(&range.end) || is_blank(&range.tz) {
        return Err(ContextError::invalid("timeRange.start/end/tz are required"));
    }

    let versions = &context.contract_versions;
    if is_blank(&versions.mcp) || is_blank(&versions.tool) || is_blank(&versions.fixture) {
        return Err(ContextError::invalid(
            "contractVersions.mcp/tool/fixture are required",
        ));
    }

    Ok(())
}

impl<T> ToolEnvelope<T> {
    /// Validates the context and hands the envelope back.
    pub fn validated(self) -> Result<Self> {
        validate_context(&self.context)?;
        Ok(self)
    }
}

impl<T: DeserializeOwned> ToolEnvelope<T> {
    /// Parses an envelope from raw JSON and validates its context.
    ///
    /// Shape errors such as a non-array `featureFlags` surface as
    /// [`ContextError::Malformed`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let envelope: ToolEnvelope<T> = serde_json::from_value(value)?;
        envelope.validated()
    }
}
