//! LLM provider implementations.
//!
//! Contains the concrete [`ApiProvider`] implementations for DeepSeek and
//! OpenRouter, the shared HTTP transport they sit on, and a provider
//! factory ([`create_provider`]) that builds the right provider from an
//! [`ApiConfig`].
//!
//! [`ApiProvider`]: deepcision_core::llm::provider::ApiProvider

pub mod deepseek;
pub mod openrouter;
pub mod transport;

use std::pin::Pin;

use futures_util::Stream;
use serde_json::{Value, json};

use deepcision_core::llm::box_provider::BoxApiProvider;
use deepcision_core::llm::manager::ProviderFactory;
use deepcision_core::llm::params::ResolvedParameters;
use deepcision_types::config::ApiConfig;
use deepcision_types::error::ProviderError;
use deepcision_types::llm::{ChatRequest, ProviderKind};

use self::deepseek::DeepSeekProvider;
use self::openrouter::OpenRouterProvider;
use crate::config::{DeepSeekSettings, Env, OpenRouterSettings, ProcessEnv};

/// Boxed stream of text deltas from a streaming completion.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send + 'static>>;

/// OpenAI-style chat completion body.
///
/// `request.extra` is merged last, so provider-specific fields can be added
/// but never replace the core fields.
pub(crate) fn build_chat_body(
    request: &ChatRequest,
    default_model: &str,
    params: ResolvedParameters,
    stream: bool,
) -> Value {
    let mut body = json!({
        "model": request.model.as_deref().unwrap_or(default_model),
        "messages": request.messages,
        "temperature": params.temperature,
        "max_tokens": params.max_tokens,
        "stream": stream,
    });
    if let Value::Object(map) = &mut body {
        for (key, value) in &request.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    body
}

/// Create a [`BoxApiProvider`] of `kind` from raw configuration.
///
/// Settings missing from `config` are resolved from `env`.
pub fn create_provider(
    kind: ProviderKind,
    config: &ApiConfig,
    env: &impl Env,
) -> Result<BoxApiProvider, ProviderError> {
    match kind {
        ProviderKind::DeepSeek => {
            let settings = DeepSeekSettings::resolve(config, env)?;
            Ok(BoxApiProvider::new(DeepSeekProvider::new(settings)?))
        }
        ProviderKind::OpenRouter => {
            let settings = OpenRouterSettings::resolve(config, env)?;
            Ok(BoxApiProvider::new(OpenRouterProvider::new(settings)?))
        }
    }
}

/// [`ProviderFactory`] backed by [`create_provider`].
#[derive(Debug, Clone, Default)]
pub struct DefaultProviderFactory<E: Env = ProcessEnv> {
    env: E,
}

impl DefaultProviderFactory<ProcessEnv> {
    pub fn new() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: Env> DefaultProviderFactory<E> {
    pub fn with_env(env: E) -> Self {
        Self { env }
    }
}

impl<E: Env> ProviderFactory for DefaultProviderFactory<E> {
    fn create(&self, kind: ProviderKind, config: &ApiConfig) -> Result<BoxApiProvider, ProviderError> {
        create_provider(kind, config, &self.env)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use deepcision_core::llm::manager::ApiManager;
    use deepcision_types::llm::Message;

    use crate::config::FileConfigSource;
    use deepcision_types::config::AppConfig;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_chat_body_fields() {
        let mut request = ChatRequest::new(vec![Message::user("hi")]).with_model("deepseek-reasoner");
        request.extra.insert("top_p".into(), json!(0.9));
        request.extra.insert("model".into(), json!("ignored"));

        let params = ResolvedParameters {
            temperature: 0.0,
            max_tokens: 10,
        };
        let body = build_chat_body(&request, "deepseek-chat", params, false);
        assert_eq!(body["model"], "deepseek-reasoner");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 10);
        assert_eq!(body["stream"], false);
        assert_eq!(body["top_p"], 0.9);
    }

    #[test]
    fn test_create_provider_by_kind() {
        let env = env(&[
            ("DEEPSEEK_API_KEY", "sk-ds"),
            ("OPENROUTER_API_KEY", "sk-or-v1-abc"),
        ]);
        let deepseek = create_provider(ProviderKind::DeepSeek, &ApiConfig::default(), &env).unwrap();
        assert_eq!(deepseek.name(), "deepseek");
        assert_eq!(deepseek.model(), "deepseek-chat");

        let openrouter = create_provider(ProviderKind::OpenRouter, &ApiConfig::default(), &env).unwrap();
        assert_eq!(openrouter.name(), "openrouter");
        assert_eq!(openrouter.model(), "openai/gpt-4");
    }

    #[test]
    fn test_create_provider_missing_key() {
        let err = create_provider(ProviderKind::OpenRouter, &ApiConfig::default(), &env(&[]))
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::Configuration { .. }));
    }

    #[test]
    fn test_manager_initialize_from_env_only() {
        let env = env(&[("DEEPSEEK_API_KEY", "sk-ds")]);
        let source = FileConfigSource::with_env(&AppConfig::default(), env.clone());
        let factory = DefaultProviderFactory::with_env(env);

        let mut manager = ApiManager::new();
        let report = manager.initialize(&source, &factory);
        assert_eq!(report.registered, vec!["deepseek"]);
        assert_eq!(report.not_configured, vec!["openrouter"]);
        assert!(report.is_clean());
        assert!(manager.get_api("deepseek").is_some());
    }

    #[test]
    fn test_manager_initialize_reports_bad_key() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "openrouter".into(),
            ApiConfig {
                api_key: Some("not-a-key".into()),
                ..Default::default()
            },
        );
        let source = FileConfigSource::with_env(&config, env(&[]));
        let factory = DefaultProviderFactory::with_env(env(&[]));

        let mut manager = ApiManager::new();
        let report = manager.initialize(&source, &factory);
        assert!(report.registered.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "openrouter");
        assert_eq!(report.failed[0].1.message(), "Invalid OpenRouter API key format");
        assert!(manager.is_empty());
    }
}
