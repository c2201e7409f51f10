//! Credential resolution gate.
//!
//! Decides whether an adapter may run in live mode. The gate only checks that
//! the configuration is complete; it never contacts a secret store.

use serde::{Deserialize, Serialize};

use crate::models::{AdapterId, IngestMode};

pub const CREDENTIALS_BACKEND_VAR: &str = "FICECAL_CREDENTIALS_BACKEND";
pub const SECRET_RESOLVER_ENDPOINT_VAR: &str = "FICECAL_SECRET_RESOLVER_ENDPOINT";

/// Environment-provided settings the gate consults in live mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSettings {
    pub backend: Option<String>,
    pub resolver_endpoint: Option<String>,
}

impl CredentialSettings {
    pub fn new(backend: Option<String>, resolver_endpoint: Option<String>) -> Self {
        Self {
            backend: non_blank(backend),
            resolver_endpoint: non_blank(resolver_endpoint),
        }
    }
}

/// Trimmed value, or `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialReason {
    DeterministicMode,
    MissingCredentialRef,
    MissingCredentialsBackend,
    MissingSecretResolverEndpoint,
    ResolverWired,
}

impl CredentialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeterministicMode => "deterministic_mode",
            Self::MissingCredentialRef => "missing_credential_ref",
            Self::MissingCredentialsBackend => "missing_credentials_backend",
            Self::MissingSecretResolverEndpoint => "missing_secret_resolver_endpoint",
            Self::ResolverWired => "resolver_wired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResolution {
    pub adapter_id: AdapterId,
    pub ingest_mode: IngestMode,
    pub credential_ref: Option<String>,
    pub backend: Option<String>,
    pub resolver_endpoint: Option<String>,
    pub resolved: bool,
    pub reason: CredentialReason,
}

/// Applies the gate rules in order: deterministic mode always passes, then a
/// credential ref, a backend and a resolver endpoint are each required.
pub fn resolve_credential_ref(
    adapter_id: &AdapterId,
    ingest_mode: IngestMode,
    credential_ref: Option<&str>,
    settings: &CredentialSettings,
) -> CredentialResolution {
    let credential_ref = credential_ref
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let (resolved, reason) = match ingest_mode {
        IngestMode::Deterministic => (true, CredentialReason::DeterministicMode),
        IngestMode::Live if credential_ref.is_none() => {
            (false, CredentialReason::MissingCredentialRef)
        }
        IngestMode::Live if settings.backend.is_none() => {
            (false, CredentialReason::MissingCredentialsBackend)
        }
        IngestMode::Live if settings.resolver_endpoint.is_none() => {
            (false, CredentialReason::MissingSecretResolverEndpoint)
        }
        IngestMode::Live => (true, CredentialReason::ResolverWired),
    };

    CredentialResolution {
        adapter_id: adapter_id.clone(),
        ingest_mode,
        credential_ref,
        backend: settings.backend.clone(),
        resolver_endpoint: settings.resolver_endpoint.clone(),
        resolved,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws() -> AdapterId {
        AdapterId::parse("aws-billing").unwrap()
    }

    fn wired() -> CredentialSettings {
        CredentialSettings::new(Some("vault".into()), Some("https://resolver.local".into()))
    }

    #[test]
    fn deterministic_mode_always_resolves() {
        let res = resolve_credential_ref(
            &aws(),
            IngestMode::Deterministic,
            None,
            &CredentialSettings::default(),
        );
        assert!(res.resolved);
        assert_eq!(res.reason, CredentialReason::DeterministicMode);
    }

    #[test]
    fn live_mode_requires_credential_ref() {
        let res = resolve_credential_ref(&aws(), IngestMode::Live, Some("  "), &wired());
        assert!(!res.resolved);
        assert_eq!(res.reason, CredentialReason::MissingCredentialRef);
        assert!(res.credential_ref.is_none());
    }

    #[test]
    fn live_mode_checks_backend_before_endpoint() {
        let res = resolve_credential_ref(
            &aws(),
            IngestMode::Live,
            Some("vault://aws"),
            &CredentialSettings::default(),
        );
        assert_eq!(res.reason, CredentialReason::MissingCredentialsBackend);

        let backend_only = CredentialSettings::new(Some("vault".into()), Some(" ".into()));
        let res = resolve_credential_ref(&aws(), IngestMode::Live, Some("vault://aws"), &backend_only);
        assert_eq!(res.reason, CredentialReason::MissingSecretResolverEndpoint);
        assert!(!res.resolved);
    }

    #[test]
    fn live_mode_with_full_config_is_wired() {
        let res = resolve_credential_ref(&aws(), IngestMode::Live, Some("vault://aws"), &wired());
        assert!(res.resolved);
        assert_eq!(res.reason.as_str(), "resolver_wired");
        assert_eq!(res.credential_ref.as_deref(), Some("vault://aws"));
        assert_eq!(res.backend.as_deref(), Some("vault"));
    }

    #[test]
    fn reason_serializes_snake_case() {
        let json = serde_json::to_string(&CredentialReason::MissingSecretResolverEndpoint).unwrap();
        assert_eq!(json, "\"missing_secret_resolver_endpoint\"");
    }
}
