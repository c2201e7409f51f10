//! AWS billing adapter.
//!
//! Maps per-account Cost Explorer style spend onto the canonical snapshot.
//! Rows are synthetic; the retry/backoff plan is reported in provenance but
//! never executed.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::adapter::mapper::{
    ConfidenceRule, ProviderProfile, ScopeField, ServiceWeight, WeightTableMapper,
};
use crate::adapter::BillingAdapter;
use crate::errors::AdapterError;
use crate::hash::seeded_flag;
use crate::models::{AdapterId, CanonicalHandoff, IngestRequest, PayloadValidation, PeriodSnapshot};

const ADAPTER_ID: &str = "aws-billing";
const MAX_RETRY_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 250;
/// One in this many runs is simulated as rate limited.
const RATE_LIMIT_MODULUS: u32 = 5;

/// Simulated retry schedule for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RetryPlan {
    attempts: u32,
    rate_limited: bool,
    backoff_schedule_ms: Vec<u64>,
}

impl RetryPlan {
    fn for_request(request: &IngestRequest) -> Self {
        let seed = format!("{}:{}", request.integration_run_id, request.mapping_profile);
        let rate_limited = seeded_flag(&seed, RATE_LIMIT_MODULUS);
        let attempts = if rate_limited { MAX_RETRY_ATTEMPTS } else { 1 };
        let backoff_schedule_ms = (2..=attempts)
            .map(|attempt| BASE_BACKOFF_MS * 2_u64.pow(attempt - 2))
            .collect();

        Self {
            attempts,
            rate_limited,
            backoff_schedule_ms,
        }
    }

    fn warnings(&self) -> Vec<String> {
        let mut warnings = vec![format!(
            "Retry policy configured: maxAttempts={}, baseBackoffMs={}.",
            MAX_RETRY_ATTEMPTS, BASE_BACKOFF_MS
        )];
        if self.rate_limited {
            let schedule = self
                .backoff_schedule_ms
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            warnings.push(format!(
                "Rate-limit fallback engaged with {} attempts and backoff [{}].",
                self.attempts, schedule
            ));
        }
        warnings
    }
}

pub struct AwsBillingAdapter {
    mapper: WeightTableMapper,
}

impl AwsBillingAdapter {
    pub fn new() -> Self {
        Self {
            mapper: WeightTableMapper::new(ProviderProfile {
                adapter_id: ADAPTER_ID,
                source_version: "aws-readonly-v1.0.0",
                scope_field: ScopeField::Account,
                sentinel_scope: "000000000000",
                spend_floor: 1100,
                spend_spread: 900,
                services: vec![
                    ServiceWeight::new("ec2", dec!(0.46), true),
                    ServiceWeight::new("ebs", dec!(0.19), false),
                    ServiceWeight::new("data-transfer", dec!(0.17), false),
                    ServiceWeight::new("rds", dec!(0.18), true),
                ],
                budget_multiplier: dec!(1.12),
                coverage_base: dec!(83),
                coverage_per_row: dec!(1.4),
                coverage_cap: dec!(97),
                confidence: ConfidenceRule::RowsAbove(4),
            }),
        }
    }
}

impl Default for AwsBillingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BillingAdapter for AwsBillingAdapter {
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
        let retry_plan = RetryPlan::for_request(request);
        Ok(self.mapper.handoff(request, &rows, retry_plan.warnings()))
    }
}
