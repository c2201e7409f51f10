//! Azure billing adapter.
//!
//! Maps per-subscription Cost Management style spend onto the canonical
//! snapshot and reports the page plan a live export would follow.

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

const ADAPTER_ID: &str = "azure-billing";
const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PaginationPlan {
    page_size: usize,
    pages: usize,
    total_rows: usize,
}

impl PaginationPlan {
    fn for_rows(total_rows: usize) -> Self {
        Self {
            page_size: PAGE_SIZE,
            pages: total_rows.div_ceil(PAGE_SIZE).max(1),
            total_rows,
        }
    }

    fn warnings(&self) -> Vec<String> {
        vec![
            format!(
                "Pagination policy: pageSize={}, pages={}, totalRows={}.",
                self.page_size, self.pages, self.total_rows
            ),
            "Incremental sync baseline anchored to requested billing window.".to_string(),
        ]
    }
}

pub struct AzureBillingAdapter {
    mapper: WeightTableMapper,
}

impl AzureBillingAdapter {
    pub fn new() -> Self {
        Self {
            mapper: WeightTableMapper::new(ProviderProfile {
                adapter_id: ADAPTER_ID,
                source_version: "azure-readonly-v1.0.0",
                scope_field: ScopeField::Subscription,
                sentinel_scope: "sub-default",
                spend_floor: 950,
                spend_spread: 850,
                services: vec![
                    ServiceWeight::new("virtual-machines", dec!(0.41), true),
                    ServiceWeight::new("managed-disks", dec!(0.21), false),
                    ServiceWeight::new("bandwidth", dec!(0.14), false),
                    ServiceWeight::new("sql-database", dec!(0.24), true),
                ],
                budget_multiplier: dec!(1.11),
                coverage_base: dec!(84),
                coverage_per_row: dec!(1.3),
                coverage_cap: dec!(97),
                confidence: ConfidenceRule::RowsAbove(4),
            }),
        }
    }
}

impl Default for AzureBillingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingAdapter for AzureBillingAdapter {
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
        let plan = PaginationPlan::for_rows(rows.len());
        Ok(self.mapper.handoff(request, &rows, plan.warnings()))
    }
}
