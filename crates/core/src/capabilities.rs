//! Capabilities descriptor advertised to protocol clients.
//!
//! Tool names listed here are the public contract; ingest entrypoints
//! must keep their names in sync with [`BILLING_TOOLS`].

use serde::{Deserialize, Serialize};

use crate::context::MCP_CONTRACT_VERSION;

const SCHEMA_VERSION: &str = "2026-03-01";

/// Billing ingest tools exposed under the `billing` namespace.
pub const BILLING_TOOLS: [&str; 4] = [
    "billing.openops.ingest",
    "billing.aws.ingest",
    "billing.azure.ingest",
    "billing.gcp.ingest",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolNamespace {
    pub namespace: String,
    pub version: String,
    pub tools: Vec<String>,
    pub owner_team: String,
    pub stability: String,
}

/// Legacy alias compatibility flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compatibility {
    pub legacy_aliases_enabled: bool,
    pub alias_namespace: String,
    pub parity_fixture_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesDescriptor {
    pub mcp_version: String,
    pub schema_version: String,
    pub tool_namespaces: Vec<ToolNamespace>,
    pub compatibility: Compatibility,
    pub feature_flags: Vec<String>,
}

impl CapabilitiesDescriptor {
    /// All tool names across namespaces.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tool_namespaces
            .iter()
            .flat_map(|ns| ns.tools.iter().map(String::as_str))
            .collect()
    }
}

pub fn capabilities_get() -> CapabilitiesDescriptor {
    CapabilitiesDescriptor {
        mcp_version: MCP_CONTRACT_VERSION.to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        tool_namespaces: vec![ToolNamespace {
            namespace: "billing".to_string(),
            version: "1.0".to_string(),
            tools: BILLING_TOOLS.iter().map(|t| t.to_string()).collect(),
            owner_team: "integration-team".to_string(),
            stability: "phase-1-stub".to_string(),
        }],
        compatibility: Compatibility {
            legacy_aliases_enabled: true,
            alias_namespace: "finops".to_string(),
            parity_fixture_version: "1.0".to_string(),
        },
        feature_flags: vec!["mcp_v2".to_string(), "legacy_alias_parity".to_string()],
    }
}
