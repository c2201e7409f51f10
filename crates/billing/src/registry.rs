//! Adapter registry: maps adapter identities to implementations.
//!
//! The registry is built once at startup (built-in adapters, then placeholders
//! for every built-in identity still missing) and shared read-only behind an
//! `Arc` afterwards. Resolution of unknown identities follows the configured
//! [`ResolutionMode`].

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::adapter::{builtin_adapters, BillingAdapter, PlaceholderAdapter};
use crate::config::BillingConfig;
use crate::errors::RegistryError;
use crate::models::{AdapterId, BUILTIN_ADAPTER_IDS, DEFAULT_FALLBACK_ADAPTER_ID};

/// Policy applied when a requested identity is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Fail with a resolution error.
    Strict,
    /// Substitute the fallback adapter.
    Fallback,
}

impl ResolutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Fallback => "fallback",
        }
    }
}

impl std::str::FromStr for ResolutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown resolution mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    pub replace_existing: bool,
}

impl RegisterOptions {
    pub fn replace_existing() -> Self {
        Self {
            replace_existing: true,
        }
    }
}

/// Per-call overrides of the registry's resolution defaults.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub fallback_id: Option<AdapterId>,
    pub mode: Option<ResolutionMode>,
}

impl ResolveOptions {
    pub fn strict() -> Self {
        Self {
            mode: Some(ResolutionMode::Strict),
            ..Default::default()
        }
    }

    pub fn fallback_to(id: AdapterId) -> Self {
        Self {
            fallback_id: Some(id),
            mode: Some(ResolutionMode::Fallback),
        }
    }
}

/// Outcome of resolving an identity.
#[derive(Clone)]
pub struct Resolution {
    pub requested_id: String,
    pub resolved_id: AdapterId,
    pub used_fallback: bool,
    pub adapter: Arc<dyn BillingAdapter>,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("requested_id", &self.requested_id)
            .field("resolved_id", &self.resolved_id)
            .field("used_fallback", &self.used_fallback)
            .finish_non_exhaustive()
    }
}

/// Registry of billing adapters keyed by identity.
pub struct AdapterRegistry {
    adapters: BTreeMap<AdapterId, Arc<dyn BillingAdapter>>,
    default_mode: ResolutionMode,
    default_fallback_id: AdapterId,
}

impl AdapterRegistry {
    /// Empty registry. Nothing is registered, not even the fallback.
    pub fn new(default_mode: ResolutionMode) -> Self {
        Self {
            adapters: BTreeMap::new(),
            default_mode,
            default_fallback_id: AdapterId::builtin(DEFAULT_FALLBACK_ADAPTER_ID),
        }
    }

    pub fn with_fallback(mut self, fallback_id: AdapterId) -> Self {
        self.default_fallback_id = fallback_id;
        self
    }

    /// Registry holding the built-in adapters plus placeholders for every
    /// remaining built-in identity.
    pub fn with_builtins(default_mode: ResolutionMode) -> Result<Self, RegistryError> {
        let mut registry = Self::new(default_mode);
        registry.register_all(builtin_adapters(), RegisterOptions::default())?;
        registry.register_builtin_placeholders()?;
        Ok(registry)
    }

    /// Built-in registry using the mode and fallback from configuration.
    pub fn bootstrap(config: &BillingConfig) -> Result<Self, RegistryError> {
        Ok(Self::with_builtins(config.resolution_mode)?
            .with_fallback(config.fallback_adapter_id.clone()))
    }

    fn register_builtin_placeholders(&mut self) -> Result<(), RegistryError> {
        for raw in BUILTIN_ADAPTER_IDS {
            if self.adapters.contains_key(raw) {
                continue;
            }
            debug!("Registering placeholder billing adapter for {}", raw);
            let placeholder = PlaceholderAdapter::new(AdapterId::builtin(raw));
            self.register(Arc::new(placeholder), RegisterOptions::default())?;
        }
        Ok(())
    }

    /// Register an adapter. Fails on a malformed identity, or when the
    /// identity is taken and `replace_existing` is not set.
    pub fn register(
        &mut self,
        adapter: Arc<dyn BillingAdapter>,
        options: RegisterOptions,
    ) -> Result<(), RegistryError> {
        let id = adapter.id().clone();
        if !AdapterId::is_valid_format(id.as_str()) {
            return Err(RegistryError::InvalidAdapterId {
                id: id.to_string(),
            });
        }
        if self.adapters.contains_key(&id) && !options.replace_existing {
            return Err(RegistryError::AlreadyRegistered { id: id.to_string() });
        }
        self.adapters.insert(id, adapter);
        Ok(())
    }

    pub fn register_all(
        &mut self,
        adapters: impl IntoIterator<Item = Arc<dyn BillingAdapter>>,
        options: RegisterOptions,
    ) -> Result<(), RegistryError> {
        for adapter in adapters {
            self.register(adapter, options)?;
        }
        Ok(())
    }

    /// Resolve an identity under the given (or default) policy.
    pub fn resolve(
        &self,
        requested: &str,
        options: ResolveOptions,
    ) -> Result<Resolution, RegistryError> {
        if let Some((id, adapter)) = self.adapters.get_key_value(requested) {
            return Ok(Resolution {
                requested_id: requested.to_string(),
                resolved_id: id.clone(),
                used_fallback: false,
                adapter: Arc::clone(adapter),
            });
        }

        match options.mode.unwrap_or(self.default_mode) {
            ResolutionMode::Strict => Err(RegistryError::Unresolved {
                requested: requested.to_string(),
                message: format!(
                    "Unknown billing adapter '{}' and strict resolution mode is enabled.",
                    requested
                ),
            }),
            ResolutionMode::Fallback => {
                let fallback_id = options
                    .fallback_id
                    .unwrap_or_else(|| self.default_fallback_id.clone());
                let adapter = self.adapters.get(&fallback_id).ok_or_else(|| {
                    RegistryError::FallbackNotRegistered {
                        requested: requested.to_string(),
                        fallback: fallback_id.to_string(),
                    }
                })?;
                debug!(
                    "Billing adapter '{}' not registered, falling back to {}",
                    requested, fallback_id
                );
                Ok(Resolution {
                    requested_id: requested.to_string(),
                    resolved_id: fallback_id.clone(),
                    used_fallback: true,
                    adapter: Arc::clone(adapter),
                })
            }
        }
    }

    /// Adapter for an identity under the registry defaults.
    pub fn get(&self, requested: &str) -> Result<Arc<dyn BillingAdapter>, RegistryError> {
        self.resolve(requested, ResolveOptions::default())
            .map(|resolution| resolution.adapter)
    }

    /// All registered identities (sorted via BTreeMap).
    pub fn ids(&self) -> Vec<AdapterId> {
        self.adapters.keys().cloned().collect()
    }

    /// Whether `value` is a registered identity.
    pub fn contains(&self, value: &str) -> bool {
        self.adapters.contains_key(value)
    }

    /// Lexical check only; see [`AdapterId::is_valid_format`].
    pub fn is_valid_format(value: &str) -> bool {
        AdapterId::is_valid_format(value)
    }

    pub fn default_mode(&self) -> ResolutionMode {
        self.default_mode
    }

    pub fn default_fallback_id(&self) -> &AdapterId {
        &self.default_fallback_id
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AdapterError;
    use crate::models::{CanonicalHandoff, IngestRequest, PayloadValidation, PeriodSnapshot};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::BTreeSet;

    struct StubAdapter {
        id: AdapterId,
    }

    impl StubAdapter {
        fn arc(id: &str) -> Arc<dyn BillingAdapter> {
            Arc::new(Self {
                id: AdapterId::parse(id).unwrap(),
            })
        }
    }

    #[async_trait]
    impl BillingAdapter for StubAdapter {
        fn id(&self) -> &AdapterId {
            &self.id
        }

        async fn discover_scope_identifiers(
            &self,
            _request: &IngestRequest,
        ) -> Result<BTreeSet<String>, AdapterError> {
            Ok(BTreeSet::new())
        }

        async fn fetch_period_snapshot(
            &self,
            request: &IngestRequest,
        ) -> Result<PeriodSnapshot, AdapterError> {
            Ok(PeriodSnapshot::for_request(request, 0))
        }

        fn validate_payload(&self, _payload: &Value) -> PayloadValidation {
            PayloadValidation::from_errors(Vec::new())
        }

        fn map_to_canonical(
            &self,
            _request: &IngestRequest,
            _payload: &Value,
        ) -> Result<CanonicalHandoff, AdapterError> {
            Err(AdapterError::runtime("stub"))
        }
    }

    #[test]
    fn register_and_get() {
        let mut reg = AdapterRegistry::new(ResolutionMode::Strict);
        reg.register(StubAdapter::arc("acme-billing"), RegisterOptions::default())
            .unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("acme-billing"));
        assert!(!reg.contains("other-billing"));
        assert_eq!(reg.get("acme-billing").unwrap().id().as_str(), "acme-billing");
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut reg = AdapterRegistry::new(ResolutionMode::Strict);
        reg.register(StubAdapter::arc("dup-billing"), RegisterOptions::default())
            .unwrap();
        let err = reg
            .register(StubAdapter::arc("dup-billing"), RegisterOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyRegistered {
                id: "dup-billing".into()
            }
        );
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn replace_existing_overrides() {
        let mut reg = AdapterRegistry::with_builtins(ResolutionMode::Strict).unwrap();
        let before = reg.len();
        reg.register(StubAdapter::arc("aws-billing"), RegisterOptions::replace_existing())
            .unwrap();
        assert_eq!(reg.len(), before);
        let adapter = reg.get("aws-billing").unwrap();
        let request = IngestRequest::new("run-1", "default", "2026-01-01", "2026-01-31", "USD");
        assert!(adapter.map_to_canonical(&request, &Value::Null).is_err());
    }

    #[test]
    fn bootstrap_resolves_every_builtin() {
        let reg = AdapterRegistry::with_builtins(ResolutionMode::Strict).unwrap();
        assert_eq!(reg.len(), BUILTIN_ADAPTER_IDS.len());
        for id in BUILTIN_ADAPTER_IDS {
            let resolution = reg.resolve(id, ResolveOptions::default()).unwrap();
            assert!(!resolution.used_fallback);
            assert_eq!(resolution.resolved_id.as_str(), id);
        }
    }

    #[test]
    fn ids_are_sorted() {
        let reg = AdapterRegistry::with_builtins(ResolutionMode::Fallback).unwrap();
        let ids: Vec<String> = reg.ids().into_iter().map(String::from).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(ids[0], "alibaba-billing");
    }

    #[test]
    fn strict_mode_rejects_unknown_id() {
        let reg = AdapterRegistry::with_builtins(ResolutionMode::Fallback).unwrap();
        let err = reg
            .resolve("unknown-billing", ResolveOptions::strict())
            .unwrap_err();
        assert!(err.is_resolution_error());
        match err {
            RegistryError::Unresolved { requested, message } => {
                assert_eq!(requested, "unknown-billing");
                assert!(message.contains("strict resolution mode"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fallback_mode_substitutes_fallback() {
        let reg = AdapterRegistry::with_builtins(ResolutionMode::Fallback).unwrap();
        let resolution = reg
            .resolve("unknown-billing", ResolveOptions::default())
            .unwrap();
        assert!(resolution.used_fallback);
        assert_eq!(resolution.requested_id, "unknown-billing");
        assert_eq!(resolution.resolved_id.as_str(), "openops-billing");

        let aws = AdapterId::parse("aws-billing").unwrap();
        let resolution = reg
            .resolve("not an id", ResolveOptions::fallback_to(aws))
            .unwrap();
        assert_eq!(resolution.adapter.id().as_str(), "aws-billing");
    }

    #[test]
    fn missing_fallback_is_configuration_error() {
        let reg = AdapterRegistry::new(ResolutionMode::Fallback);
        let Err(err) = reg.get("unknown-billing") else {
            panic!("resolved without a registered fallback");
        };
        assert!(!err.is_resolution_error());
        assert_eq!(
            err,
            RegistryError::FallbackNotRegistered {
                requested: "unknown-billing".into(),
                fallback: "openops-billing".into(),
            }
        );
    }

    #[test]
    fn bootstrap_uses_config() {
        let config = BillingConfig::new(ResolutionMode::Fallback)
            .with_fallback_adapter(AdapterId::parse("gcp-billing").unwrap());
        let reg = AdapterRegistry::bootstrap(&config).unwrap();
        assert_eq!(reg.default_mode(), ResolutionMode::Fallback);
        let resolution = reg.resolve("nope-billing", ResolveOptions::default()).unwrap();
        assert_eq!(resolution.resolved_id.as_str(), "gcp-billing");
    }

    #[test]
    fn lexical_check_is_independent_of_registration() {
        let reg = AdapterRegistry::new(ResolutionMode::Strict);
        assert!(AdapterRegistry::is_valid_format("future-cloud-billing"));
        assert!(!reg.contains("future-cloud-billing"));
        assert!(!AdapterRegistry::is_valid_format("billing"));
    }

    #[test]
    fn resolution_mode_parses() {
        assert_eq!("Strict".parse::<ResolutionMode>().unwrap(), ResolutionMode::Strict);
        assert!("lenient".parse::<ResolutionMode>().is_err());
    }
}
