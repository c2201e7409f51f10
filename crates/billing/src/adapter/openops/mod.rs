//! OpenOps billing adapter.
//!
//! Aggregates workspace-level spend from OpenOps. Each workspace maps to one
//! derived account identifier (`acct-<workspace>`), which is what discovery
//! reports.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::adapter::mapper::{
    ConfidenceRule, ProviderProfile, ScopeField, ServiceWeight, WeightTableMapper,
};
use crate::adapter::BillingAdapter;
use crate::errors::AdapterError;
use crate::models::{AdapterId, CanonicalHandoff, IngestRequest, PayloadValidation, PeriodSnapshot};

const ADAPTER_ID: &str = "openops-billing";

/// Account id derived from a workspace id: alphanumerics only, lowercased.
fn derive_account_id(workspace_id: &str) -> String {
    let cleaned: String = workspace_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if cleaned.is_empty() {
        "acct-default".to_string()
    } else {
        format!("acct-{}", cleaned)
    }
}

pub struct OpenopsBillingAdapter {
    mapper: WeightTableMapper,
}

impl OpenopsBillingAdapter {
    pub fn new() -> Self {
        Self {
            mapper: WeightTableMapper::new(ProviderProfile {
                adapter_id: ADAPTER_ID,
                source_version: "openops-readonly-v1.0.0",
                scope_field: ScopeField::Workspace,
                sentinel_scope: "workspace-default",
                spend_floor: 800,
                spend_spread: 700,
                services: vec![
                    ServiceWeight::new("compute", dec!(0.44), true),
                    ServiceWeight::new("storage", dec!(0.18), false),
                    ServiceWeight::new("network", dec!(0.16), false),
                    ServiceWeight::new("database", dec!(0.22), true),
                ],
                budget_multiplier: dec!(1.15),
                coverage_base: dec!(82),
                coverage_per_row: dec!(1.5),
                coverage_cap: dec!(98),
                confidence: ConfidenceRule::MultipleRequestedScopes,
            }),
        }
    }
}

impl Default for OpenopsBillingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingAdapter for OpenopsBillingAdapter {
    fn id(&self) -> &AdapterId {
        self.mapper.id()
    }

    async fn discover_scope_identifiers(
        &self,
        request: &IngestRequest,
    ) -> Result<BTreeSet<String>, AdapterError> {
        Ok(self
            .mapper
            .scope_ids(request)
            .iter()
            .map(String::as_str)
            .map(derive_account_id)
            .collect())
    }

    async fn fetch_period_snapshot(
        &self,
        request: &IngestRequest,
    ) -> Result<PeriodSnapshot, AdapterError> {
        let rows = self.mapper.cost_rows(request);
        Ok(PeriodSnapshot::for_request(request, rows.len()))
    }

    fn validate_payload(&self, payload: &Value) -> PayloadValidation {
        self.mapper.validate_payload(payload)
    }

    fn map_to_canonical(
        &self,
        request: &IngestRequest,
        payload: &Value,
    ) -> Result<CanonicalHandoff, AdapterError> {
        self.mapper.ensure_valid(payload)?;

        let rows = self.mapper.cost_rows(request);
        Ok(self.mapper.handoff(request, &rows, Vec::new()))
    }
}
