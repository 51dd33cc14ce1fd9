//! API manager: name-keyed registry of live providers.

use std::collections::{BTreeMap, HashMap};

use deepcision_types::config::ApiConfig;
use deepcision_types::error::ProviderError;
use deepcision_types::llm::ProviderKind;

use super::box_provider::BoxApiProvider;

/// Supplies raw provider configuration by registry name.
///
/// Implementations live in deepcision-infra (e.g., `FileConfigSource`).
pub trait ConfigSource: Send + Sync {
    fn get_config(&self, name: &str) -> Option<ApiConfig>;
}

impl ConfigSource for BTreeMap<String, ApiConfig> {
    fn get_config(&self, name: &str) -> Option<ApiConfig> {
        self.get(name).cloned()
    }
}

impl ConfigSource for HashMap<String, ApiConfig> {
    fn get_config(&self, name: &str) -> Option<ApiConfig> {
        self.get(name).cloned()
    }
}

/// Builds a provider of `kind` from its raw configuration.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, kind: ProviderKind, config: &ApiConfig) -> Result<BoxApiProvider, ProviderError>;
}

/// Outcome of [`ApiManager::initialize`], one entry per supported provider.
#[derive(Debug, Default)]
pub struct InitReport {
    pub registered: Vec<String>,
    pub not_configured: Vec<String>,
    pub failed: Vec<(String, ProviderError)>,
}

impl InitReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry of live providers, indexed by name.
///
/// Mutated through `&mut self` at startup only; share it behind an `Arc`
/// afterwards.
pub struct ApiManager {
    providers: HashMap<String, BoxApiProvider>,
}

impl ApiManager {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under `name`, replacing any existing one.
    pub fn add_api(&mut self, name: impl Into<String>, provider: BoxApiProvider) {
        let name = name.into();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::debug!(provider = %name, "replaced registered provider");
        }
    }

    pub fn get_api(&self, name: &str) -> Option<&BoxApiProvider> {
        self.providers.get(name)
    }

    pub fn remove_api(&mut self, name: &str) -> Option<BoxApiProvider> {
        self.providers.remove(name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build and register every supported provider that has configuration.
    ///
    /// A provider without configuration is reported as not configured; a
    /// provider whose construction fails is reported with its error and the
    /// remaining providers are still attempted.
    pub fn initialize(
        &mut self,
        source: &impl ConfigSource,
        factory: &impl ProviderFactory,
    ) -> InitReport {
        let mut report = InitReport::default();

        for kind in ProviderKind::ALL {
            let name = kind.as_str();
            let Some(config) = source.get_config(name) else {
                tracing::debug!(provider = name, "provider not configured");
                report.not_configured.push(name.to_string());
                continue;
            };

            match factory.create(kind, &config) {
                Ok(provider) => {
                    tracing::info!(provider = name, model = provider.model(), "provider registered");
                    self.add_api(name, provider);
                    report.registered.push(name.to_string());
                }
                Err(e) => {
                    tracing::warn!(provider = name, error = %e, "provider initialization failed");
                    report.failed.push((name.to_string(), e));
                }
            }
        }

        report
    }

    /// Probe every registered provider. Results are sorted by name.
    pub async fn health_report(&self) -> Vec<(String, bool)> {
        let mut report = Vec::with_capacity(self.providers.len());
        for name in self.names() {
            if let Some(provider) = self.providers.get(name) {
                report.push((name.to_string(), provider.health_check().await));
            }
        }
        report
    }

    /// Drop every registered provider.
    pub fn shutdown(&mut self) {
        self.providers.clear();
    }
}

impl Default for ApiManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::tests::EchoProvider;

    struct EchoFactory;

    impl ProviderFactory for EchoFactory {
        fn create(&self, kind: ProviderKind, config: &ApiConfig) -> Result<BoxApiProvider, ProviderError> {
            if config.api_key.is_none() {
                return Err(ProviderError::configuration(format!("{kind} API key not found")));
            }
            Ok(BoxApiProvider::new(EchoProvider::new(kind.as_str())))
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut manager = ApiManager::new();
        manager.add_api("echo", BoxApiProvider::new(EchoProvider::new("first")));
        assert_eq!(manager.get_api("echo").unwrap().name(), "first");
        assert!(manager.get_api("missing").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut manager = ApiManager::new();
        manager.add_api("echo", BoxApiProvider::new(EchoProvider::new("first")));
        manager.add_api("echo", BoxApiProvider::new(EchoProvider::new("second")));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get_api("echo").unwrap().name(), "second");
    }

    #[test]
    fn test_initialize_reports_each_outcome() {
        let mut configs = BTreeMap::new();
        configs.insert("deepseek".to_string(), ApiConfig::default());

        let mut manager = ApiManager::new();
        let report = manager.initialize(&configs, &EchoFactory);
        assert!(report.registered.is_empty());
        assert_eq!(report.not_configured, vec!["openrouter"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "deepseek");
        assert!(!report.is_clean());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_initialize_registers_configured() {
        let mut configs = BTreeMap::new();
        for name in ["deepseek", "openrouter"] {
            configs.insert(
                name.to_string(),
                ApiConfig {
                    api_key: Some("sk-test".into()),
                    ..Default::default()
                },
            );
        }

        let mut manager = ApiManager::new();
        let report = manager.initialize(&configs, &EchoFactory);
        assert!(report.is_clean());
        assert_eq!(report.registered, vec!["deepseek", "openrouter"]);
        assert_eq!(manager.names(), vec!["deepseek", "openrouter"]);

        manager.shutdown();
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_health_report() {
        let mut manager = ApiManager::new();
        manager.add_api("b", BoxApiProvider::new(EchoProvider::new("b")));
        manager.add_api("a", BoxApiProvider::new(EchoProvider::new("a")));
        let report = manager.health_report().await;
        assert_eq!(report, vec![("a".to_string(), true), ("b".to_string(), true)]);
    }
}
