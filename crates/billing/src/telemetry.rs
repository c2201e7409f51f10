//! Billing telemetry events and sinks.
//!
//! The orchestrator emits through an injected [`TelemetrySink`]. Tests and
//! local tooling use [`InMemoryTelemetrySink`]; deployments without a
//! collector can forward events to the log with [`LogTelemetrySink`].

use chrono::{DateTime, Utc};
use ficecal_core::context::{RequestContext, RequestMode};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::IngestErrorCode;
use crate::models::{AdapterId, CanonicalHandoff, MappingConfidence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelemetryEventName {
    #[serde(rename = "billing.run")]
    Run,
    #[serde(rename = "billing.mapping.summary")]
    MappingSummary,
}

impl TelemetryEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "billing.run",
            Self::MappingSummary => "billing.mapping.summary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSummary {
    pub infra_total: Decimal,
    pub concession_pct: Decimal,
    pub budget_cap: Decimal,
    pub row_count: usize,
    pub mapping_confidence: MappingConfidence,
    pub coverage_pct: Decimal,
}

impl From<&CanonicalHandoff> for MappingSummary {
    fn from(handoff: &CanonicalHandoff) -> Self {
        Self {
            infra_total: handoff.canonical.infra_total,
            concession_pct: handoff.canonical.concession_pct,
            budget_cap: handoff.canonical.budget_cap,
            row_count: handoff.canonical.row_count,
            mapping_confidence: handoff.provenance.mapping_confidence,
            coverage_pct: handoff.provenance.coverage_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub event_name: TelemetryEventName,
    pub timestamp: DateTime<Utc>,
    pub adapter_id: AdapterId,
    pub integration_run_id: String,
    pub request_id: String,
    pub trace_id: String,
    pub workspace_id: String,
    pub mode: RequestMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_fallback: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<IngestErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_summary: Option<MappingSummary>,
}

impl TelemetryEvent {
    /// Event stamped now, correlated with the request context.
    pub fn new(
        event_name: TelemetryEventName,
        adapter_id: AdapterId,
        integration_run_id: impl Into<String>,
        context: &RequestContext,
    ) -> Self {
        Self {
            event_name,
            timestamp: Utc::now(),
            adapter_id,
            integration_run_id: integration_run_id.into(),
            request_id: context.request_id.clone(),
            trace_id: context.trace_id.clone(),
            workspace_id: context.workspace_id.clone(),
            mode: context.mode,
            status: None,
            duration_ms: None,
            used_fallback: None,
            error_code: None,
            mapping_summary: None,
        }
    }

    pub fn is_run(&self) -> bool {
        self.event_name == TelemetryEventName::Run
    }
}

/// Receives telemetry events in emission order.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: TelemetryEvent);
}

/// Append-only in-memory event log.
#[derive(Debug, Default)]
pub struct InMemoryTelemetrySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl InMemoryTelemetrySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TelemetryEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot copy of every recorded event.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl TelemetrySink for InMemoryTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        self.lock().push(event);
    }
}

/// Writes each event to the `billing::telemetry` log target as one JSON line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetrySink;

impl TelemetrySink for LogTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => info!(target: "billing::telemetry", "{}", line),
            Err(e) => warn!(
                target: "billing::telemetry",
                "Failed to serialize {} event for {}: {}",
                event.event_name.as_str(),
                event.adapter_id,
                e
            ),
        }
    }
}
