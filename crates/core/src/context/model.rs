//! Request context carried alongside every tool input.

use serde::{Deserialize, Serialize};

const DEFAULT_REQUEST_ID: &str = "mcp-req-unknown";
const DEFAULT_WORKSPACE_ID: &str = "default";
const DEFAULT_TZ: &str = "UTC";
const DEFAULT_RANGE_START: &str = "1970-01-01";
const DEFAULT_RANGE_END: &str = "1970-01-01";

/// Current protocol contract version.
pub const MCP_CONTRACT_VERSION: &str = "2.0";

/// UX depth the caller is operating in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    Quick,
    Operator,
    Architect,
}

/// Who initiated the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Human,
    Agent,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: String,
    pub end: String,
    pub tz: String,
}

/// Versions of the protocol, tool schema and fixture pack the caller speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractVersions {
    pub mcp: String,
    pub tool: String,
    pub fixture: String,
}

/// Correlation and policy context for a single tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub request_id: String,
    pub trace_id: String,
    pub mode: RequestMode,
    pub workspace_id: String,
    pub actor: Actor,
    pub time_range: TimeRange,
    pub contract_versions: ContractVersions,
    pub feature_flags: Vec<String>,
}

impl RequestContext {
    /// Builds the context used when a caller invokes a tool without an envelope.
    ///
    /// Blank ids fall back to `mcp-req-unknown`; a blank trace id reuses the request id.
    pub fn default_for(request_id: Option<&str>, trace_id: Option<&str>) -> Self {
        let request_id = request_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_REQUEST_ID)
            .to_string();
        let trace_id = trace_id
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| request_id.clone());

        Self {
            request_id,
            trace_id,
            mode: RequestMode::Operator,
            workspace_id: DEFAULT_WORKSPACE_ID.to_string(),
            actor: Actor::System,
            time_range: TimeRange {
                start: DEFAULT_RANGE_START.to_string(),
                end: DEFAULT_RANGE_END.to_string(),
                tz: DEFAULT_TZ.to_string(),
            },
            contract_versions: ContractVersions {
                mcp: MCP_CONTRACT_VERSION.to_string(),
                tool: "1.0".to_string(),
                fixture: "1.0".to_string(),
            },
            feature_flags: Vec::new(),
        }
    }
}

/// A tool input paired with its request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEnvelope<T> {
    pub context: RequestContext,
    pub input: T,
}

impl<T> ToolEnvelope<T> {
    pub fn new(context: RequestContext, input: T) -> Self {
        Self { context, input }
    }
}
