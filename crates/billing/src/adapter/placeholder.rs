//! Placeholder adapter for built-in identities without a real implementation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::adapter::BillingAdapter;
use crate::errors::AdapterError;
use crate::models::{
    AdapterId, CanonicalHandoff, CanonicalSnapshot, IngestRequest, MappingConfidence,
    PayloadValidation, PeriodSnapshot, Provenance,
};

const PLACEHOLDER_WARNING: &str = "Placeholder adapter - not in Phase 1 scope.";

/// Accepts any payload and reports a zero snapshot with `low` confidence.
pub struct PlaceholderAdapter {
    id: AdapterId,
    source_version: String,
}

impl PlaceholderAdapter {
    pub fn new(id: AdapterId) -> Self {
        let source_version = format!("{}-placeholder-v0.1.0", id.provider_name());
        Self { id, source_version }
    }
}

#[async_trait]
impl BillingAdapter for PlaceholderAdapter {
    fn id(&self) -> &AdapterId {
        &self.id
    }

    async fn discover_scope_identifiers(
        &self,
        _request: &IngestRequest,
    ) -> Result<BTreeSet<String>, AdapterError> {
        Ok(BTreeSet::new())
    }

    async fn fetch_period_snapshot(
        &self,
        request: &IngestRequest,
    ) -> Result<PeriodSnapshot, AdapterError> {
        Ok(PeriodSnapshot::for_request(request, 0))
    }

    fn validate_payload(&self, _payload: &Value) -> PayloadValidation {
        PayloadValidation::from_errors(Vec::new())
    }

    fn map_to_canonical(
        &self,
        request: &IngestRequest,
        _payload: &Value,
    ) -> Result<CanonicalHandoff, AdapterError> {
        Ok(CanonicalHandoff {
            integration_run_id: request.integration_run_id.clone(),
            provider_adapter_id: self.id.clone(),
            scope: request.scope(),
            canonical: CanonicalSnapshot::zero(),
            provenance: Provenance {
                source_version: self.source_version.clone(),
                coverage_pct: Decimal::ZERO,
                mapping_confidence: MappingConfidence::Low,
                warnings: vec![PLACEHOLDER_WARNING.to_string()],
            },
        })
    }
}
