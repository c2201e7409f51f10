//! Multi-cloud billing ingest.
//!
//! Provider adapters turn billing data from OpenOps, AWS, Azure and GCP into
//! one [`CanonicalHandoff`]. The [`AdapterRegistry`] resolves adapter
//! identities under a strict or fallback policy, and the ingest service runs
//! each call through validation, the credential gate and mapping while
//! emitting telemetry.

pub mod adapter;
pub mod config;
pub mod context;
pub mod credentials;
pub mod errors;
pub mod hash;
pub mod ingest;
pub mod models;
pub mod registry;
pub mod telemetry;

pub use adapter::BillingAdapter;
pub use config::BillingConfig;
pub use context::BillingContext;
pub use errors::{AdapterError, ConfigError, IngestError, IngestErrorCode, RegistryError, Result};
pub use ingest::{BillingTool, DiscoveryReport, IngestService, IngestServiceTrait};
pub use models::{
    AdapterId, CanonicalHandoff, CanonicalSnapshot, IngestMode, IngestRequest, MappingConfidence,
    Provenance,
};
pub use registry::{AdapterRegistry, RegisterOptions, ResolutionMode, ResolveOptions};
pub use telemetry::{InMemoryTelemetrySink, LogTelemetrySink, TelemetryEvent, TelemetrySink};
