//! GCP billing adapter.
//!
//! Maps per-billing-account export spend onto the canonical snapshot. Accepts
//! an optional `providerScope` object for project/folder filters.

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

const ADAPTER_ID: &str = "gcp-billing";

const BASELINE_WARNINGS: [&str; 2] = [
    "Telemetry baseline: billing.run and billing.mapping.summary emitted.",
    "Recommender-ready provenance baseline enabled.",
];

pub struct GcpBillingAdapter {
    mapper: WeightTableMapper,
}

impl GcpBillingAdapter {
    pub fn new() -> Self {
        Self {
            mapper: WeightTableMapper::new(ProviderProfile {
                adapter_id: ADAPTER_ID,
                source_version: "gcp-readonly-v1.0.0",
                scope_field: ScopeField::BillingAccount,
                sentinel_scope: "000000-000000-000000",
                spend_floor: 980,
                spend_spread: 1020,
                services: vec![
                    ServiceWeight::new("compute-engine", dec!(0.43), true),
                    ServiceWeight::new("cloud-storage", dec!(0.14), false),
                    ServiceWeight::new("cloud-sql", dec!(0.23), true),
                    ServiceWeight::new("cloud-networking", dec!(0.12), false),
                    ServiceWeight::new("bigquery", dec!(0.08), false),
                ],
                budget_multiplier: dec!(1.09),
                coverage_base: dec!(85),
                coverage_per_row: dec!(1.25),
                coverage_cap: dec!(98),
                confidence: ConfidenceRule::RowsAbove(5),
            }),
        }
    }
}

impl Default for GcpBillingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingAdapter for GcpBillingAdapter {
    fn id(&self) -> &AdapterId {
        self.mapper.id()
    }

    async fn discover_scope_identifiers(
        &self,
        request: &IngestRequest,
    ) -> Result<BTreeSet<String>, AdapterError> {
        Ok(self.mapper.scope_ids(request).into_iter().collect())
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
        let warnings = BASELINE_WARNINGS.iter().map(|w| w.to_string()).collect();
        Ok(self.mapper.handoff(request, &rows, warnings))
    }
}
