//! Service context owning the registry, telemetry sink and ingest service.

use std::sync::Arc;

use crate::config::BillingConfig;
use crate::errors::ConfigError;
use crate::ingest::{IngestService, IngestServiceTrait};
use crate::registry::AdapterRegistry;
use crate::telemetry::{InMemoryTelemetrySink, TelemetrySink};

pub struct BillingContext {
    config: BillingConfig,
    registry: Arc<AdapterRegistry>,
    /// Kept concrete so callers can list or clear recorded events.
    telemetry: Arc<InMemoryTelemetrySink>,
    ingest_service: Arc<dyn IngestServiceTrait>,
}

impl BillingContext {
    /// Builds the registry with every built-in adapter and wires the ingest
    /// service to a fresh in-memory telemetry sink.
    pub fn bootstrap(config: BillingConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(AdapterRegistry::bootstrap(&config)?);
        let telemetry = Arc::new(InMemoryTelemetrySink::new());
        let sink: Arc<dyn TelemetrySink> = telemetry.clone();
        let ingest_service = Arc::new(IngestService::new(
            Arc::clone(&registry),
            sink,
            config.clone(),
        ));

        Ok(Self {
            config,
            registry,
            telemetry,
            ingest_service,
        })
    }

    /// [`bootstrap`](Self::bootstrap) with configuration read from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::bootstrap(BillingConfig::from_env()?)
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<AdapterRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn telemetry(&self) -> Arc<InMemoryTelemetrySink> {
        Arc::clone(&self.telemetry)
    }

    pub fn ingest_service(&self) -> Arc<dyn IngestServiceTrait> {
        Arc::clone(&self.ingest_service)
    }
}
