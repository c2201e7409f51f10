use serde::{Deserialize, Serialize};

/// Per-provider ingest tools exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingTool {
    Openops,
    Aws,
    Azure,
    Gcp,
}

impl BillingTool {
    pub const ALL: [BillingTool; 4] = [Self::Openops, Self::Aws, Self::Azure, Self::Gcp];

    /// Tool name as published in the capabilities descriptor.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Openops => "billing.openops.ingest",
            Self::Aws => "billing.aws.ingest",
            Self::Azure => "billing.azure.ingest",
            Self::Gcp => "billing.gcp.ingest",
        }
    }

    /// Adapter identity the tool resolves.
    pub fn adapter_id(&self) -> &'static str {
        match self {
            Self::Openops => "openops-billing",
            Self::Aws => "aws-billing",
            Self::Azure => "azure-billing",
            Self::Gcp => "gcp-billing",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.tool_name() == name)
    }
}
