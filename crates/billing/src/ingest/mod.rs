//! Ingest orchestrator.
//!
//! Every call runs Resolve → Validate → credential gate (live mode only) →
//! Map → Emit. Failures are classified into an [`IngestErrorCode`] and
//! recorded as exactly one failed `billing.run` event before being returned.
//! Registry misconfiguration and envelope rejection are returned without
//! telemetry.
//!
//! [`IngestErrorCode`]: crate::errors::IngestErrorCode

mod classify;
mod payload;
mod service;
mod tools;


pub use classify::{classify_adapter_error, classify_runtime_message, infer_validation_code};
pub use payload::build_payload;
pub use service::{DiscoveryReport, IngestService, IngestServiceTrait};
pub use tools::BillingTool;
