//! Billing ingest configuration.

use crate::credentials::{
    non_blank, CredentialSettings, CREDENTIALS_BACKEND_VAR, SECRET_RESOLVER_ENDPOINT_VAR,
};
use crate::errors::ConfigError;
use crate::models::{AdapterId, IngestMode, DEFAULT_FALLBACK_ADAPTER_ID};
use crate::registry::ResolutionMode;

pub const RESOLUTION_MODE_VAR: &str = "BILLING_ADAPTER_RESOLUTION_MODE";
pub const INGEST_MODE_VAR: &str = "BILLING_INGEST_MODE";
pub const FALLBACK_ADAPTER_VAR: &str = "BILLING_FALLBACK_ADAPTER_ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    /// Policy for unregistered adapter identities. Always set explicitly.
    pub resolution_mode: ResolutionMode,
    pub fallback_adapter_id: AdapterId,
    /// Used when a request does not carry its own ingest mode.
    pub default_ingest_mode: IngestMode,
    pub credentials: CredentialSettings,
}

impl BillingConfig {
    pub fn new(resolution_mode: ResolutionMode) -> Self {
        Self {
            resolution_mode,
            fallback_adapter_id: AdapterId::builtin(DEFAULT_FALLBACK_ADAPTER_ID),
            default_ingest_mode: IngestMode::Deterministic,
            credentials: CredentialSettings::default(),
        }
    }

    pub fn with_fallback_adapter(mut self, id: AdapterId) -> Self {
        self.fallback_adapter_id = id;
        self
    }

    pub fn with_default_ingest_mode(mut self, mode: IngestMode) -> Self {
        self.default_ingest_mode = mode;
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialSettings) -> Self {
        self.credentials = credentials;
        self
    }

    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| non_blank(lookup(var));

        let mode_raw = read(RESOLUTION_MODE_VAR).ok_or(ConfigError::MissingVar(RESOLUTION_MODE_VAR))?;
        let resolution_mode = mode_raw
            .parse::<ResolutionMode>()
            .map_err(|_| ConfigError::InvalidValue {
                var: RESOLUTION_MODE_VAR,
                value: mode_raw.clone(),
            })?;

        let mut config = Self::new(resolution_mode);

        if let Some(raw) = read(INGEST_MODE_VAR) {
            config.default_ingest_mode =
                raw.parse::<IngestMode>()
                    .map_err(|_| ConfigError::InvalidValue {
                        var: INGEST_MODE_VAR,
                        value: raw.clone(),
                    })?;
        }

        if let Some(raw) = read(FALLBACK_ADAPTER_VAR) {
            config.fallback_adapter_id = AdapterId::parse(&raw)?;
        }

        config.credentials = CredentialSettings::new(
            read(CREDENTIALS_BACKEND_VAR),
            read(SECRET_RESOLVER_ENDPOINT_VAR),
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RegistryError;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn resolution_mode_is_required() {
        let err = BillingConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(RESOLUTION_MODE_VAR));

        let err = BillingConfig::from_lookup(lookup(&[(RESOLUTION_MODE_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingVar(RESOLUTION_MODE_VAR));
    }

    #[test]
    fn minimal_env_uses_defaults() {
        let config = BillingConfig::from_lookup(lookup(&[(RESOLUTION_MODE_VAR, "strict")])).unwrap();
        assert_eq!(config.resolution_mode, ResolutionMode::Strict);
        assert_eq!(config.fallback_adapter_id.as_str(), "openops-billing");
        assert_eq!(config.default_ingest_mode, IngestMode::Deterministic);
        assert_eq!(config.credentials, CredentialSettings::default());
    }

    #[test]
    fn full_env_is_read_and_trimmed() {
        let config = BillingConfig::from_lookup(lookup(&[
            (RESOLUTION_MODE_VAR, " fallback "),
            (INGEST_MODE_VAR, "live"),
            (FALLBACK_ADAPTER_VAR, "aws-billing"),
            (CREDENTIALS_BACKEND_VAR, "vault"),
            (SECRET_RESOLVER_ENDPOINT_VAR, " https://resolver.local "),
        ]))
        .unwrap();
        assert_eq!(config.resolution_mode, ResolutionMode::Fallback);
        assert_eq!(config.default_ingest_mode, IngestMode::Live);
        assert_eq!(config.fallback_adapter_id.as_str(), "aws-billing");
        assert_eq!(config.credentials.backend.as_deref(), Some("vault"));
        assert_eq!(
            config.credentials.resolver_endpoint.as_deref(),
            Some("https://resolver.local")
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = BillingConfig::from_lookup(lookup(&[(RESOLUTION_MODE_VAR, "lenient")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: RESOLUTION_MODE_VAR, .. }));

        let err = BillingConfig::from_lookup(lookup(&[
            (RESOLUTION_MODE_VAR, "strict"),
            (INGEST_MODE_VAR, "replay"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: INGEST_MODE_VAR, .. }));

        let err = BillingConfig::from_lookup(lookup(&[
            (RESOLUTION_MODE_VAR, "strict"),
            (FALLBACK_ADAPTER_VAR, "openops"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Registry(RegistryError::InvalidAdapterId { id: "openops".into() })
        );
    }
}
