//! Billing ingest models shared by adapters, the registry and the orchestrator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::errors::RegistryError;

const ADAPTER_ID_SUFFIX: &str = "-billing";

/// Built-in adapter identities. Every one of these resolves after bootstrap,
/// either to a real adapter or to a placeholder.
pub const BUILTIN_ADAPTER_IDS: [&str; 8] = [
    "openops-billing",
    "aws-billing",
    "azure-billing",
    "gcp-billing",
    "oci-billing",
    "ibm-billing",
    "alibaba-billing",
    "huawei-billing",
];

/// Adapter used when fallback resolution kicks in.
pub const DEFAULT_FALLBACK_ADAPTER_ID: &str = "openops-billing";

/// The only auth mode adapters accept.
pub const READ_ONLY_AUTH_MODE: &str = "read-only";

/// Identity of a billing adapter, always of the form `<name>-billing`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdapterId(String);

impl AdapterId {
    /// Parses an identity, rejecting anything that is not `<name>-billing`.
    pub fn parse(value: &str) -> Result<Self, RegistryError> {
        if Self::is_valid_format(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(RegistryError::InvalidAdapterId {
                id: value.to_string(),
            })
        }
    }

    /// Lexical check only: lowercase alphanumeric segments joined by `-`,
    /// ending in `-billing`. Says nothing about registration.
    pub fn is_valid_format(value: &str) -> bool {
        let Some(name) = value.strip_suffix(ADAPTER_ID_SUFFIX) else {
            return false;
        };
        !name.is_empty()
            && name.split('-').all(|segment| {
                !segment.is_empty()
                    && segment
                        .bytes()
                        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            })
    }

    /// Identity for compile-time constants; callers guarantee the format.
    pub(crate) fn builtin(value: &'static str) -> Self {
        debug_assert!(Self::is_valid_format(value), "bad builtin id {value}");
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Provider name without the `-billing` suffix.
    pub fn provider_name(&self) -> &str {
        self.0.strip_suffix(ADAPTER_ID_SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AdapterId {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AdapterId> for String {
    fn from(id: AdapterId) -> Self {
        id.0
    }
}

impl AsRef<str> for AdapterId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AdapterId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingConfidence {
    Low,
    Medium,
    High,
}

impl MappingConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Deterministic runs use synthetic data only; live runs need resolved credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    #[default]
    Deterministic,
    Live,
}

impl IngestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Live => "live",
        }
    }
}

impl std::str::FromStr for IngestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" => Ok(Self::Deterministic),
            "live" => Ok(Self::Live),
            other => Err(format!("unknown ingest mode '{}'", other)),
        }
    }
}

/// Billing window and reporting currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingScope {
    pub start_date: String,
    pub end_date: String,
    pub currency: String,
}

/// Input for a single ingest call.
///
/// Scope lists are optional; adapters substitute a sentinel identifier when
/// their list is absent or empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub integration_run_id: String,
    pub mapping_profile: String,
    pub start_date: String,
    pub end_date: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest_mode: Option<IngestMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
    /// Only `read-only` is accepted; anything else fails payload validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_scope: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_scope: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_scope: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_account_scope: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_scope: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_scope: Option<serde_json::Value>,
}

impl IngestRequest {
    pub fn new(
        integration_run_id: impl Into<String>,
        mapping_profile: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            integration_run_id: integration_run_id.into(),
            mapping_profile: mapping_profile.into(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            currency: currency.into(),
            ..Default::default()
        }
    }

    pub fn scope(&self) -> BillingScope {
        BillingScope {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            currency: self.currency.clone(),
        }
    }

    /// True when a non-blank credential reference was supplied.
    pub fn has_credential_ref(&self) -> bool {
        self.credential_ref
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

/// Canonical financial snapshot. All amounts are rounded to 2 dp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSnapshot {
    pub infra_total: Decimal,
    pub concession_pct: Decimal,
    pub budget_cap: Decimal,
    pub row_count: usize,
}

impl CanonicalSnapshot {
    pub fn zero() -> Self {
        Self {
            infra_total: Decimal::ZERO,
            concession_pct: Decimal::ZERO,
            budget_cap: Decimal::ZERO,
            row_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub source_version: String,
    pub coverage_pct: Decimal,
    pub mapping_confidence: MappingConfidence,
    pub warnings: Vec<String>,
}

/// The uniform billing summary returned regardless of source provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalHandoff {
    pub integration_run_id: String,
    pub provider_adapter_id: AdapterId,
    pub scope: BillingScope,
    pub canonical: CanonicalSnapshot,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSnapshot {
    pub start_date: String,
    pub end_date: String,
    pub currency: String,
    pub raw_record_count: usize,
}

impl PeriodSnapshot {
    pub fn for_request(request: &IngestRequest, raw_record_count: usize) -> Self {
        Self {
            start_date: request.start_date.clone(),
            end_date: request.end_date.clone(),
            currency: request.currency.clone(),
            raw_record_count,
        }
    }
}

/// Outcome of a structural payload check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl PayloadValidation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_id_format() {
        assert!(AdapterId::is_valid_format("aws-billing"));
        assert!(AdapterId::is_valid_format("my-cloud2-billing"));
        assert!(!AdapterId::is_valid_format("-billing"));
        assert!(!AdapterId::is_valid_format("aws"));
        assert!(!AdapterId::is_valid_format("AWS-billing"));
        assert!(!AdapterId::is_valid_format("aws--billing"));
        assert!(!AdapterId::is_valid_format("aws_x-billing"));
    }

    #[test]
    fn builtin_ids_are_well_formed() {
        for id in BUILTIN_ADAPTER_IDS {
            assert!(AdapterId::is_valid_format(id), "{id}");
        }
        assert!(BUILTIN_ADAPTER_IDS.contains(&DEFAULT_FALLBACK_ADAPTER_ID));
    }

    #[test]
    fn adapter_id_provider_name() {
        let id = AdapterId::parse("alibaba-billing").unwrap();
        assert_eq!(id.provider_name(), "alibaba");
    }

    #[test]
    fn adapter_id_deserialize_rejects_bad_format() {
        assert!(serde_json::from_str::<AdapterId>("\"gcp-billing\"").is_ok());
        assert!(serde_json::from_str::<AdapterId>("\"gcp\"").is_err());
    }

    #[test]
    fn request_deserializes_with_optional_fields_absent() {
        let json = r#"{
            "integrationRunId": "run-1",
            "mappingProfile": "default",
            "startDate": "2026-01-01",
            "endDate": "2026-01-31",
            "currency": "USD"
        }"#;
        let request: IngestRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.integration_run_id, "run-1");
        assert!(request.ingest_mode.is_none());
        assert!(request.account_scope.is_none());
        assert!(!request.has_credential_ref());
    }

    #[test]
    fn ingest_mode_parses() {
        assert_eq!("LIVE".parse::<IngestMode>().unwrap(), IngestMode::Live);
        assert!("dry".parse::<IngestMode>().is_err());
    }
}
