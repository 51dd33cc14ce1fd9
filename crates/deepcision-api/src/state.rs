//! Application state wiring the registries together.
//!
//! AppState holds the provider registry, role manager and tokenizer service
//! used by both CLI commands and REST handlers. Registries are populated
//! once here and shared read-only afterwards.

use std::path::Path;
use std::sync::Arc;

use deepcision_core::agent::manager::RoleManager;
use deepcision_core::llm::manager::ApiManager;
use deepcision_core::tokenizer::{TokenizerOptions, TokenizerService};
use deepcision_infra::config::{FileConfigSource, load_app_config_or_default};
use deepcision_infra::llm::DefaultProviderFactory;
use deepcision_infra::roles::ConfiguredRoles;
use deepcision_infra::tokenizer::default_service;
use deepcision_types::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub apis: Arc<ApiManager>,
    pub roles: Arc<RoleManager>,
    pub tokenizers: Arc<TokenizerService>,
}

impl AppState {
    /// Load configuration, register providers and roles.
    ///
    /// Provider and role failures are logged, not fatal: the state is still
    /// usable with whatever loaded.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = load_app_config_or_default(config_path).await;

        let mut apis = ApiManager::new();
        let report = apis.initialize(&FileConfigSource::new(&config), &DefaultProviderFactory::new());
        for (name, err) in &report.failed {
            tracing::warn!(provider = %name, error = %err, "provider unavailable");
        }

        let mut roles = RoleManager::new();
        if !roles.load_templates(&ConfiguredRoles::new(&config)).await {
            tracing::warn!("no role templates loaded");
        }

        Ok(Self::from_parts(config, apis, roles, default_service()))
    }

    pub fn from_parts(
        config: AppConfig,
        apis: ApiManager,
        roles: RoleManager,
        tokenizers: TokenizerService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            apis: Arc::new(apis),
            roles: Arc::new(roles),
            tokenizers: Arc::new(tokenizers),
        }
    }

    /// Tokenizer construction options from the `tokenizer` config section.
    pub fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            model_dir: self.config.tokenizer.model_dir.clone(),
        }
    }
}
