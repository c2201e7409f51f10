use async_trait::async_trait;
use ficecal_core::context::{RequestContext, ToolEnvelope};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::classify::{classify_adapter_error, infer_validation_code};
use super::payload::build_payload;
use super::tools::BillingTool;
use crate::config::BillingConfig;
use crate::credentials::resolve_credential_ref;
use crate::errors::{IngestError, IngestErrorCode, RegistryError, Result};
use crate::models::{AdapterId, CanonicalHandoff, IngestMode, IngestRequest, PeriodSnapshot};
use crate::registry::{AdapterRegistry, Resolution, ResolveOptions};
use crate::telemetry::{MappingSummary, RunStatus, TelemetryEvent, TelemetryEventName, TelemetrySink};

/// Scope identifiers and billing window an adapter would ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub adapter_id: AdapterId,
    pub scope_identifiers: Vec<String>,
    pub period: PeriodSnapshot,
}

#[async_trait]
pub trait IngestServiceTrait: Send + Sync {
    /// Ingest with a context synthesized from the run id.
    async fn ingest(&self, tool: BillingTool, request: IngestRequest) -> Result<CanonicalHandoff>;

    /// Ingest with a caller-supplied context. The context is validated
    /// before the adapter is resolved.
    async fn ingest_envelope(
        &self,
        tool: BillingTool,
        envelope: ToolEnvelope<IngestRequest>,
    ) -> Result<CanonicalHandoff>;

    /// Ingest against any adapter identity, registered or not.
    async fn ingest_adapter(
        &self,
        adapter_id: &str,
        request: &IngestRequest,
        context: &RequestContext,
    ) -> Result<CanonicalHandoff>;

    /// Resolves the adapter and reports discovery results. Emits no telemetry.
    async fn discover(&self, tool: BillingTool, request: &IngestRequest) -> Result<DiscoveryReport>;

    async fn ingest_openops(&self, request: IngestRequest) -> Result<CanonicalHandoff> {
        self.ingest(BillingTool::Openops, request).await
    }

    async fn ingest_aws(&self, request: IngestRequest) -> Result<CanonicalHandoff> {
        self.ingest(BillingTool::Aws, request).await
    }

    async fn ingest_azure(&self, request: IngestRequest) -> Result<CanonicalHandoff> {
        self.ingest(BillingTool::Azure, request).await
    }

    async fn ingest_gcp(&self, request: IngestRequest) -> Result<CanonicalHandoff> {
        self.ingest(BillingTool::Gcp, request).await
    }

    async fn ingest_openops_v2(
        &self,
        envelope: ToolEnvelope<IngestRequest>,
    ) -> Result<CanonicalHandoff> {
        self.ingest_envelope(BillingTool::Openops, envelope).await
    }

    async fn ingest_aws_v2(&self, envelope: ToolEnvelope<IngestRequest>) -> Result<CanonicalHandoff> {
        self.ingest_envelope(BillingTool::Aws, envelope).await
    }

    async fn ingest_azure_v2(
        &self,
        envelope: ToolEnvelope<IngestRequest>,
    ) -> Result<CanonicalHandoff> {
        self.ingest_envelope(BillingTool::Azure, envelope).await
    }

    async fn ingest_gcp_v2(&self, envelope: ToolEnvelope<IngestRequest>) -> Result<CanonicalHandoff> {
        self.ingest_envelope(BillingTool::Gcp, envelope).await
    }
}

/// Resolve, validate, gate credentials, map, emit.
pub struct IngestService {
    registry: Arc<AdapterRegistry>,
    telemetry: Arc<dyn TelemetrySink>,
    config: BillingConfig,
}

/// Per-call state shared by the telemetry helpers.
struct RunScope<'a> {
    request: &'a IngestRequest,
    context: &'a RequestContext,
    started: Instant,
}

impl RunScope<'_> {
    fn duration_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl IngestService {
    pub fn new(
        registry: Arc<AdapterRegistry>,
        telemetry: Arc<dyn TelemetrySink>,
        config: BillingConfig,
    ) -> Self {
        Self {
            registry,
            telemetry,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            fallback_id: Some(self.config.fallback_adapter_id.clone()),
            mode: Some(self.config.resolution_mode),
        }
    }

    /// Resolution failures become `validation_error`; misconfiguration is
    /// returned as-is.
    fn resolve(&self, requested: &str) -> Result<Resolution> {
        match self.registry.resolve(requested, self.resolve_options()) {
            Ok(resolution) => Ok(resolution),
            Err(RegistryError::Unresolved { requested, message }) => {
                let adapter_id = AdapterId::parse(&requested)
                    .unwrap_or_else(|_| self.config.fallback_adapter_id.clone());
                Err(IngestError::failed(
                    IngestErrorCode::ValidationError,
                    adapter_id,
                    format!("Adapter resolution failed for '{}': {}", requested, message),
                ))
            }
            Err(e) => Err(IngestError::Configuration(e)),
        }
    }

    fn run_event(&self, scope: &RunScope<'_>, adapter_id: AdapterId) -> TelemetryEvent {
        let mut event = TelemetryEvent::new(
            TelemetryEventName::Run,
            adapter_id,
            scope.request.integration_run_id.as_str(),
            scope.context,
        );
        event.duration_ms = Some(scope.duration_ms());
        event
    }

    /// Emits the single failed run event for a classified error.
    fn record_failure(&self, scope: &RunScope<'_>, used_fallback: Option<bool>, error: &IngestError) {
        let (Some(code), Some(adapter_id)) = (error.code(), error.adapter_id()) else {
            return;
        };
        warn!(
            "Billing ingest run '{}' failed: {}",
            scope.request.integration_run_id, error
        );

        let mut event = self.run_event(scope, adapter_id.clone());
        event.status = Some(RunStatus::Failed);
        event.used_fallback = used_fallback;
        event.error_code = Some(code);
        self.telemetry.emit(event);
    }

    fn record_success(&self, scope: &RunScope<'_>, resolution: &Resolution, handoff: &CanonicalHandoff) {
        let mut run = self.run_event(scope, resolution.resolved_id.clone());
        run.status = Some(RunStatus::Success);
        run.used_fallback = Some(resolution.used_fallback);
        self.telemetry.emit(run);

        let mut summary = TelemetryEvent::new(
            TelemetryEventName::MappingSummary,
            resolution.resolved_id.clone(),
            scope.request.integration_run_id.as_str(),
            scope.context,
        );
        summary.used_fallback = Some(resolution.used_fallback);
        summary.mapping_summary = Some(MappingSummary::from(handoff));
        self.telemetry.emit(summary);

        debug!(
            "Billing ingest run '{}' mapped by {} in {}ms ({} rows)",
            scope.request.integration_run_id,
            resolution.resolved_id,
            scope.duration_ms(),
            handoff.canonical.row_count
        );
    }

    /// Validate, gate and map against an already resolved adapter.
    fn map_resolved(
        &self,
        resolution: &Resolution,
        request: &IngestRequest,
    ) -> Result<CanonicalHandoff> {
        let adapter_id = &resolution.resolved_id;
        let payload = build_payload(adapter_id, request);

        let validation = resolution.adapter.validate_payload(&payload);
        if !validation.valid {
            return Err(IngestError::failed(
                infer_validation_code(&validation.errors),
                adapter_id.clone(),
                format!("Invalid payload: {}", validation.errors.join(", ")),
            ));
        }

        let ingest_mode = request.ingest_mode.unwrap_or(self.config.default_ingest_mode);
        if ingest_mode == IngestMode::Live {
            let credentials = resolve_credential_ref(
                adapter_id,
                ingest_mode,
                request.credential_ref.as_deref(),
                &self.config.credentials,
            );
            if !credentials.resolved {
                return Err(IngestError::failed(
                    IngestErrorCode::AuthError,
                    adapter_id.clone(),
                    format!(
                        "Credential resolution failed in live mode: {}",
                        credentials.reason.as_str()
                    ),
                ));
            }
            debug!(
                "Credentials for {} resolved ({})",
                adapter_id,
                credentials.reason.as_str()
            );
        }

        resolution
            .adapter
            .map_to_canonical(request, &payload)
            .map_err(|e| IngestError::failed(classify_adapter_error(&e), adapter_id.clone(), e.to_string()))
    }
}

#[async_trait]
impl IngestServiceTrait for IngestService {
    async fn ingest(&self, tool: BillingTool, request: IngestRequest) -> Result<CanonicalHandoff> {
        let run_id = request.integration_run_id.as_str();
        let context = RequestContext::default_for(Some(run_id), Some(run_id));
        self.ingest_adapter(tool.adapter_id(), &request, &context).await
    }

    async fn ingest_envelope(
        &self,
        tool: BillingTool,
        envelope: ToolEnvelope<IngestRequest>,
    ) -> Result<CanonicalHandoff> {
        let envelope = envelope.validated()?;
        self.ingest_adapter(tool.adapter_id(), &envelope.input, &envelope.context)
            .await
    }

    async fn ingest_adapter(
        &self,
        adapter_id: &str,
        request: &IngestRequest,
        context: &RequestContext,
    ) -> Result<CanonicalHandoff> {
        let scope = RunScope {
            request,
            context,
            started: Instant::now(),
        };

        let resolution = match self.resolve(adapter_id) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.record_failure(&scope, None, &e);
                return Err(e);
            }
        };

        match self.map_resolved(&resolution, request) {
            Ok(handoff) => {
                self.record_success(&scope, &resolution, &handoff);
                Ok(handoff)
            }
            Err(e) => {
                self.record_failure(&scope, Some(resolution.used_fallback), &e);
                Err(e)
            }
        }
    }

    async fn discover(&self, tool: BillingTool, request: &IngestRequest) -> Result<DiscoveryReport> {
        let resolution = self.resolve(tool.adapter_id())?;
        let adapter_id = resolution.resolved_id.clone();
        let classify = |e: crate::errors::AdapterError| {
            IngestError::failed(classify_adapter_error(&e), adapter_id.clone(), e.to_string())
        };

        let scope_identifiers = resolution
            .adapter
            .discover_scope_identifiers(request)
            .await
            .map_err(classify)?;
        let period = resolution
            .adapter
            .fetch_period_snapshot(request)
            .await
            .map_err(classify)?;

        Ok(DiscoveryReport {
            adapter_id: resolution.resolved_id,
            scope_identifiers: scope_identifiers.into_iter().collect(),
            period,
        })
    }
}
