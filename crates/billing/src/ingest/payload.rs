use serde_json::{json, Value};

use crate::models::{AdapterId, IngestRequest};

/// Adapter-agnostic payload built from a request. Absent optionals become
/// `null`, which adapter validation treats as not provided.
pub fn build_payload(adapter_id: &AdapterId, request: &IngestRequest) -> Value {
    json!({
        "adapterId": adapter_id,
        "period": {
            "startDate": request.start_date,
            "endDate": request.end_date,
            "currency": request.currency,
        },
        "credentialRef": request.credential_ref,
        "authMode": request.auth_mode,
        "workspaceScope": request.workspace_scope,
        "accountScope": request.account_scope,
        "subscriptionScope": request.subscription_scope,
        "billingAccountScope": request.billing_account_scope,
        "tenantScope": request.tenant_scope,
        "providerScope": request.provider_scope,
    })
}
