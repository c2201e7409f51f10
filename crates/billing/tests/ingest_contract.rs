//! End-to-end ingest properties across every built-in adapter.

use std::sync::Arc;

use ficecal_billing::models::BUILTIN_ADAPTER_IDS;
use ficecal_billing::telemetry::{RunStatus, TelemetryEventName};
use ficecal_billing::{
    AdapterRegistry, BillingConfig, BillingContext, BillingTool, IngestErrorCode, IngestRequest,
    RegistryError, ResolutionMode, ResolveOptions,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const SERVICE_COUNTS: [(BillingTool, usize); 4] = [
    (BillingTool::Openops, 4),
    (BillingTool::Aws, 4),
    (BillingTool::Azure, 4),
    (BillingTool::Gcp, 5),
];

fn context(mode: ResolutionMode) -> BillingContext {
    BillingContext::bootstrap(BillingConfig::new(mode)).unwrap()
}

fn request(run_id: &str, profile: &str) -> IngestRequest {
    IngestRequest::new(run_id, profile, "2026-03-01", "2026-03-31", "USD")
}

fn with_scopes(tool: BillingTool, mut req: IngestRequest, ids: &[&str]) -> IngestRequest {
    let ids = Some(ids.iter().map(|s| s.to_string()).collect());
    match tool {
        BillingTool::Openops => req.workspace_scope = ids,
        BillingTool::Aws => req.account_scope = ids,
        BillingTool::Azure => req.subscription_scope = ids,
        BillingTool::Gcp => req.billing_account_scope = ids,
    }
    req
}

#[tokio::test]
async fn identical_inputs_produce_identical_handoffs() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    for tool in BillingTool::ALL {
        let a = service.ingest(tool, request("run-7", "default")).await.unwrap();
        let b = service.ingest(tool, request("run-7", "default")).await.unwrap();
        assert_eq!(a.canonical, b.canonical, "{tool:?}");
        assert_eq!(a.provenance, b.provenance, "{tool:?}");
    }
}

#[tokio::test]
async fn mapping_profile_changes_totals() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    for tool in BillingTool::ALL {
        let a = service.ingest(tool, request("run-1", "default")).await.unwrap();
        let b = service.ingest(tool, request("run-1", "finops-v2")).await.unwrap();
        assert_ne!(a.canonical.infra_total, b.canonical.infra_total, "{tool:?}");
    }
}

#[tokio::test]
async fn row_count_is_scopes_times_services() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    for (tool, services) in SERVICE_COUNTS {
        let req = with_scopes(tool, request("run-1", "default"), &["s1", "s2", "s3"]);
        let report = service.discover(tool, &req).await.unwrap();
        let handoff = service.ingest(tool, req).await.unwrap();

        assert_eq!(report.scope_identifiers.len(), 3, "{tool:?}");
        assert_eq!(handoff.canonical.row_count, 3 * services, "{tool:?}");
        assert_eq!(report.period.raw_record_count, handoff.canonical.row_count);
    }
}

#[tokio::test]
async fn snapshot_arithmetic_holds() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    for tool in BillingTool::ALL {
        let req = with_scopes(tool, request("run-3", "default"), &["alpha", "beta"]);
        let handoff = service.ingest(tool, req).await.unwrap();
        let canonical = &handoff.canonical;

        assert!(canonical.infra_total > Decimal::ZERO);
        assert_eq!(canonical.infra_total.round_dp(2), canonical.infra_total);
        assert_eq!(canonical.budget_cap.round_dp(2), canonical.budget_cap);
        assert!(canonical.concession_pct > Decimal::ZERO && canonical.concession_pct < dec!(100));
        assert!(canonical.budget_cap > canonical.infra_total);
        assert!(handoff.provenance.coverage_pct <= dec!(98));
    }
}

#[tokio::test]
async fn empty_scope_lists_use_sentinel() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    for (tool, services) in SERVICE_COUNTS {
        let req = with_scopes(tool, request("run-1", "default"), &[]);
        let report = service.discover(tool, &req).await.unwrap();
        let handoff = service.ingest(tool, req).await.unwrap();

        assert_eq!(report.scope_identifiers.len(), 1, "{tool:?}");
        assert_eq!(handoff.canonical.row_count, services);
        assert!(handoff.canonical.infra_total > Decimal::ZERO);
    }
}

#[tokio::test]
async fn default_scope_golden_values() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    let expected = [
        (BillingTool::Openops, dec!(1060.00), dec!(1219.00)),
        (BillingTool::Aws, dec!(1255.00), dec!(1405.60)),
        (BillingTool::Azure, dec!(1477.00), dec!(1639.47)),
        (BillingTool::Gcp, dec!(1511.00), dec!(1646.99)),
    ];
    for (tool, infra_total, budget_cap) in expected {
        let handoff = service.ingest(tool, request("run-1", "default")).await.unwrap();
        assert_eq!(handoff.canonical.infra_total, infra_total, "{tool:?}");
        assert_eq!(handoff.canonical.budget_cap, budget_cap, "{tool:?}");
    }
}

#[tokio::test]
async fn missing_currency_fails_validation() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();
    let telemetry = ctx.telemetry();

    for tool in BillingTool::ALL {
        telemetry.clear();
        let mut req = request("run-1", "default");
        req.currency = String::new();

        let err = service.ingest(tool, req).await.unwrap_err();
        assert_eq!(err.code(), Some(IngestErrorCode::ValidationError));
        assert!(err.to_string().contains("currency"));

        let events = telemetry.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, Some(RunStatus::Failed));
        assert!(events
            .iter()
            .all(|e| e.event_name != TelemetryEventName::MappingSummary));
    }
}

#[tokio::test]
async fn every_success_emits_one_run_and_one_summary() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    for tool in BillingTool::ALL {
        service.ingest(tool, request("run-1", "default")).await.unwrap();
    }

    let events = ctx.telemetry().events();
    assert_eq!(events.len(), 8);
    for pair in events.chunks(2) {
        assert_eq!(pair[0].event_name, TelemetryEventName::Run);
        assert_eq!(pair[0].status, Some(RunStatus::Success));
        assert_eq!(pair[1].event_name, TelemetryEventName::MappingSummary);
        assert_eq!(pair[0].adapter_id, pair[1].adapter_id);
    }
}

#[tokio::test]
async fn concurrent_ingests_record_every_event() {
    let ctx = context(ResolutionMode::Strict);
    let service = ctx.ingest_service();

    let calls = (0..20).map(|i| {
        let service = Arc::clone(&service);
        let tool = BillingTool::ALL[i % BillingTool::ALL.len()];
        async move { service.ingest(tool, request(&format!("run-{i}"), "default")).await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    let events = ctx.telemetry().events();
    assert_eq!(events.len(), 40);
    let runs = events
        .iter()
        .filter(|e| e.event_name == TelemetryEventName::Run)
        .count();
    assert_eq!(runs, 20);
}

#[test]
fn registry_contract() {
    let mut registry = AdapterRegistry::with_builtins(ResolutionMode::Strict).unwrap();

    for id in BUILTIN_ADAPTER_IDS {
        assert!(registry.contains(id));
        assert!(registry.resolve(id, ResolveOptions::default()).is_ok());
    }

    let err = registry
        .register(
            Arc::new(ficecal_billing::adapter::AwsBillingAdapter::new()),
            Default::default(),
        )
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));

    let err = registry
        .resolve("mystery-billing", ResolveOptions::strict())
        .unwrap_err();
    assert!(matches!(err, RegistryError::Unresolved { ref requested, .. } if requested == "mystery-billing"));

    let resolution = registry
        .resolve("mystery-billing", ResolveOptions { mode: Some(ResolutionMode::Fallback), fallback_id: None })
        .unwrap();
    assert!(resolution.used_fallback);
    assert_eq!(resolution.resolved_id.as_str(), "openops-billing");
}
