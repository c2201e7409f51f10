//! Weight-table driven synthetic mapper shared by the provider adapters.
//!
//! Each provider supplies a [`ProviderProfile`]: a service table whose weights
//! sum to 1.0 plus the constants that shape spend, budget and coverage. For
//! every scope identifier the mapper hashes `scopeId:mappingProfile` into a
//! base spend and emits one cost row per service.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::errors::AdapterError;
use crate::hash::{round2, seeded_magnitude};
use crate::models::{
    AdapterId, CanonicalHandoff, CanonicalSnapshot, IngestRequest, MappingConfidence,
    PayloadValidation, Provenance, READ_ONLY_AUTH_MODE,
};

const MISSING_CREDENTIAL_WARNING: &str =
    "credentialRef not provided; using local development source profile.";

/// Request scope lists, keyed by their payload field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeField {
    Workspace,
    Account,
    Subscription,
    BillingAccount,
    Tenant,
}

impl ScopeField {
    pub const ALL: [ScopeField; 5] = [
        ScopeField::Workspace,
        ScopeField::Account,
        ScopeField::Subscription,
        ScopeField::BillingAccount,
        ScopeField::Tenant,
    ];

    pub fn payload_key(&self) -> &'static str {
        match self {
            Self::Workspace => "workspaceScope",
            Self::Account => "accountScope",
            Self::Subscription => "subscriptionScope",
            Self::BillingAccount => "billingAccountScope",
            Self::Tenant => "tenantScope",
        }
    }

    /// The list as supplied on the request, empty when absent.
    pub fn requested<'a>(&self, request: &'a IngestRequest) -> &'a [String] {
        let list = match self {
            Self::Workspace => &request.workspace_scope,
            Self::Account => &request.account_scope,
            Self::Subscription => &request.subscription_scope,
            Self::BillingAccount => &request.billing_account_scope,
            Self::Tenant => &request.tenant_scope,
        };
        list.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone)]
pub struct ServiceWeight {
    pub service: &'static str,
    pub weight: Decimal,
    pub concession_eligible: bool,
}

impl ServiceWeight {
    pub fn new(service: &'static str, weight: Decimal, concession_eligible: bool) -> Self {
        Self {
            service,
            weight,
            concession_eligible,
        }
    }
}

/// How mapping confidence is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceRule {
    /// `high` when the row count exceeds the threshold.
    RowsAbove(usize),
    /// `high` when the caller asked for more than one scope identifier.
    MultipleRequestedScopes,
}

/// Per-provider constants for the synthetic mapper.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub adapter_id: &'static str,
    pub source_version: &'static str,
    pub scope_field: ScopeField,
    pub sentinel_scope: &'static str,
    pub spend_floor: u32,
    pub spend_spread: u32,
    pub services: Vec<ServiceWeight>,
    pub budget_multiplier: Decimal,
    pub coverage_base: Decimal,
    pub coverage_per_row: Decimal,
    pub coverage_cap: Decimal,
    pub confidence: ConfidenceRule,
}

/// One synthetic cost line. Produced per call, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostRow {
    pub scope_id: String,
    pub service: &'static str,
    pub amount: Decimal,
    pub concession_eligible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostTotals {
    pub infra_total: Decimal,
    pub concession_eligible_total: Decimal,
}

impl CostTotals {
    pub fn from_rows(rows: &[CostRow]) -> Self {
        let infra_total = round2(rows.iter().map(|r| r.amount).sum());
        let concession_eligible_total = round2(
            rows.iter()
                .filter(|r| r.concession_eligible)
                .map(|r| r.amount)
                .sum(),
        );
        Self {
            infra_total,
            concession_eligible_total,
        }
    }

    pub fn concession_pct(&self) -> Decimal {
        if self.infra_total > Decimal::ZERO {
            round2(self.concession_eligible_total * Decimal::ONE_HUNDRED / self.infra_total)
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightTableMapper {
    id: AdapterId,
    profile: ProviderProfile,
}

impl WeightTableMapper {
    pub fn new(profile: ProviderProfile) -> Self {
        Self {
            id: AdapterId::builtin(profile.adapter_id),
            profile,
        }
    }

    pub fn id(&self) -> &AdapterId {
        &self.id
    }

    #[cfg(test)]
    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Requested scope ids, or the provider's sentinel when none were given.
    pub fn scope_ids(&self, request: &IngestRequest) -> Vec<String> {
        let requested = self.profile.scope_field.requested(request);
        if requested.is_empty() {
            vec![self.profile.sentinel_scope.to_string()]
        } else {
            requested.to_vec()
        }
    }

    pub fn cost_rows(&self, request: &IngestRequest) -> Vec<CostRow> {
        let scopes = self.scope_ids(request);
        let mut rows = Vec::with_capacity(scopes.len() * self.profile.services.len());

        for scope_id in scopes {
            let seed = format!("{}:{}", scope_id, request.mapping_profile);
            let base_spend = Decimal::from(seeded_magnitude(
                &seed,
                self.profile.spend_floor,
                self.profile.spend_spread,
            ));

            for entry in &self.profile.services {
                rows.push(CostRow {
                    scope_id: scope_id.clone(),
                    service: entry.service,
                    amount: round2(base_spend * entry.weight),
                    concession_eligible: entry.concession_eligible,
                });
            }
        }

        rows
    }

    pub fn confidence(&self, request: &IngestRequest, row_count: usize) -> MappingConfidence {
        let high = match self.profile.confidence {
            ConfidenceRule::RowsAbove(threshold) => row_count > threshold,
            ConfidenceRule::MultipleRequestedScopes => {
                self.profile.scope_field.requested(request).len() > 1
            }
        };
        if high {
            MappingConfidence::High
        } else {
            MappingConfidence::Medium
        }
    }

    pub fn coverage_pct(&self, row_count: usize) -> Decimal {
        let raw = self.profile.coverage_base
            + Decimal::from(row_count) * self.profile.coverage_per_row;
        round2(raw.min(self.profile.coverage_cap))
    }

    /// Builds the handoff from freshly generated rows. Policy warnings come
    /// first; the missing-credential notice is appended here.
    pub fn handoff(
        &self,
        request: &IngestRequest,
        rows: &[CostRow],
        mut warnings: Vec<String>,
    ) -> CanonicalHandoff {
        let totals = CostTotals::from_rows(rows);

        if !request.has_credential_ref() {
            warnings.push(MISSING_CREDENTIAL_WARNING.to_string());
        }

        CanonicalHandoff {
            integration_run_id: request.integration_run_id.clone(),
            provider_adapter_id: self.id.clone(),
            scope: request.scope(),
            canonical: CanonicalSnapshot {
                infra_total: totals.infra_total,
                concession_pct: totals.concession_pct(),
                budget_cap: round2(totals.infra_total * self.profile.budget_multiplier),
                row_count: rows.len(),
            },
            provenance: Provenance {
                source_version: self.profile.source_version.to_string(),
                coverage_pct: self.coverage_pct(rows.len()),
                mapping_confidence: self.confidence(request, rows.len()),
                warnings,
            },
        }
    }

    pub fn validate_payload(&self, payload: &Value) -> PayloadValidation {
        PayloadValidation::from_errors(self.payload_errors(payload))
    }

    /// Fails with every accumulated message when the payload is invalid.
    pub fn ensure_valid(&self, payload: &Value) -> Result<(), AdapterError> {
        let errors = self.payload_errors(payload);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::InvalidPayload(errors))
        }
    }

    fn payload_errors(&self, payload: &Value) -> Vec<String> {
        let Some(candidate) = payload.as_object() else {
            return vec!["Payload must be an object".to_string()];
        };
        let mut errors = Vec::new();

        if candidate.get("adapterId").and_then(Value::as_str) != Some(self.id.as_str()) {
            errors.push(format!("adapterId must be '{}'", self.id));
        }

        check_period(candidate, &mut errors);

        let auth_mode = present(candidate, "authMode").filter(|v| v.as_str() != Some(""));
        if let Some(auth_mode) = auth_mode {
            if auth_mode.as_str() != Some(READ_ONLY_AUTH_MODE) {
                errors.push(format!(
                    "authMode must be '{}' when provided",
                    READ_ONLY_AUTH_MODE
                ));
            }
        }

        if let Some(credential_ref) = present(candidate, "credentialRef") {
            if !credential_ref.is_string() {
                errors.push("credentialRef must be a string when provided".to_string());
            }
        }

        for field in ScopeField::ALL {
            check_scope_list(candidate, field.payload_key(), &mut errors);
        }

        if let Some(provider_scope) = present(candidate, "providerScope") {
            if !provider_scope.is_object() {
                errors.push("providerScope must be an object when provided".to_string());
            }
        }

        errors
    }
}

/// Treats JSON `null` the same as an absent key.
fn present<'a>(candidate: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    candidate.get(key).filter(|v| !v.is_null())
}

fn is_non_empty_string(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.is_empty())
}

fn check_period(candidate: &Map<String, Value>, errors: &mut Vec<String>) {
    let Some(period) = candidate.get("period").and_then(Value::as_object) else {
        errors.push("period must be an object".to_string());
        return;
    };
    for field in ["startDate", "endDate", "currency"] {
        if !period.get(field).is_some_and(is_non_empty_string) {
            errors.push(format!("period.{} must be a non-empty string", field));
        }
    }
}

fn check_scope_list(candidate: &Map<String, Value>, key: &str, errors: &mut Vec<String>) {
    let Some(scope) = present(candidate, key) else {
        return;
    };
    match scope.as_array() {
        None => errors.push(format!("{} must be an array when provided", key)),
        Some(values) if !values.iter().all(is_non_empty_string) => {
            errors.push(format!("{} values must be non-empty strings", key))
        }
        Some(_) => {}
    }
}
