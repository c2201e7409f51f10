//! Billing adapter contract and built-in provider adapters.
//!
//! Every adapter maps a provider's billing data onto the canonical handoff.
//! Discovery and period fetches are async to mirror network-bound calls;
//! validation and mapping are synchronous and pure.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::errors::AdapterError;
use crate::models::{
    AdapterId, CanonicalHandoff, IngestRequest, PayloadValidation, PeriodSnapshot, Provenance,
};

pub mod aws;
pub mod azure;
pub mod gcp;
pub(crate) mod mapper;
pub mod openops;
mod placeholder;

pub use aws::AwsBillingAdapter;
pub use azure::AzureBillingAdapter;
pub use gcp::GcpBillingAdapter;
pub use openops::OpenopsBillingAdapter;
pub use placeholder::PlaceholderAdapter;

/// Uniform operation set every billing adapter implements.
///
/// Callers must run [`validate_payload`](Self::validate_payload) before
/// [`map_to_canonical`](Self::map_to_canonical); mapping an invalid payload
/// fails with every accumulated validation message.
#[async_trait]
pub trait BillingAdapter: Send + Sync {
    /// Identity the adapter registers under.
    fn id(&self) -> &AdapterId;

    /// Scope identifiers the request covers, sorted and deduplicated.
    async fn discover_scope_identifiers(
        &self,
        request: &IngestRequest,
    ) -> Result<BTreeSet<String>, AdapterError>;

    /// Billing window echo plus the number of raw records it would yield.
    async fn fetch_period_snapshot(
        &self,
        request: &IngestRequest,
    ) -> Result<PeriodSnapshot, AdapterError>;

    /// Structural check of an adapter payload. Never fails; problems are
    /// reported in the returned error list.
    fn validate_payload(&self, payload: &Value) -> PayloadValidation;

    fn map_to_canonical(
        &self,
        request: &IngestRequest,
        payload: &Value,
    ) -> Result<CanonicalHandoff, AdapterError>;

    fn emit_provenance(&self, handoff: &CanonicalHandoff) -> Provenance {
        handoff.provenance.clone()
    }
}

/// The four provider adapters shipped with the crate.
pub fn builtin_adapters() -> Vec<Arc<dyn BillingAdapter>> {
    vec![
        Arc::new(OpenopsBillingAdapter::new()),
        Arc::new(AwsBillingAdapter::new()),
        Arc::new(AzureBillingAdapter::new()),
        Arc::new(GcpBillingAdapter::new()),
    ]
}
