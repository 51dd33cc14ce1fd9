//! OpenRouterProvider -- [`ApiProvider`] for the OpenRouter gateway.
//!
//! OpenRouter fronts many upstream models behind an OpenAI-style
//! `/chat/completions` endpoint. Rate-limited requests are retried per the
//! configured [`RetryPolicy`]; optional `HTTP-Referer` / `X-Title` headers
//! attribute traffic for OpenRouter's app rankings.

use std::fmt;
use std::str::FromStr;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{Instrument, info_span};

use deepcision_core::llm::params::{GenerationLimits, resolve_parameters};
use deepcision_core::llm::provider::{ApiProvider, RequestHeaders};
use deepcision_types::error::ProviderError;
use deepcision_types::llm::{ChatRequest, GenerationDefaults, HttpMethod, ProviderKind};

use super::build_chat_body;
use super::transport::{HttpTransport, RetryPolicy};
use crate::config::{OPENROUTER_LIMITS, OpenRouterSettings};

const CHAT_ENDPOINT: &str = "/chat/completions";
const MODELS_ENDPOINT: &str = "/models";
const CREDITS_ENDPOINT: &str = "/credits";

/// Commonly used OpenRouter model ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenRouterModel {
    Gpt4,
    Gpt4Turbo,
    Claude3Opus,
    Claude3Sonnet,
    Mixtral,
    DeepSeekChat,
}

impl OpenRouterModel {
    pub const ALL: [OpenRouterModel; 6] = [
        OpenRouterModel::Gpt4,
        OpenRouterModel::Gpt4Turbo,
        OpenRouterModel::Claude3Opus,
        OpenRouterModel::Claude3Sonnet,
        OpenRouterModel::Mixtral,
        OpenRouterModel::DeepSeekChat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpenRouterModel::Gpt4 => "openai/gpt-4",
            OpenRouterModel::Gpt4Turbo => "openai/gpt-4-turbo",
            OpenRouterModel::Claude3Opus => "anthropic/claude-3-opus",
            OpenRouterModel::Claude3Sonnet => "anthropic/claude-3-sonnet",
            OpenRouterModel::Mixtral => "mistralai/mixtral-8x7b-instruct",
            OpenRouterModel::DeepSeekChat => "deepseek/deepseek-chat",
        }
    }
}

impl fmt::Display for OpenRouterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenRouterModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown OpenRouter model: {s}"))
    }
}

/// OpenRouter-specific request features.
///
/// Unset fields are omitted from the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenRouterOptions {
    /// Tools available to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    /// `"auto"`, `"none"` or a specific tool selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    /// Structured output format, e.g. `{"type": "json_object"}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    /// Prompt transforms such as `"middle-out"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Vec<String>>,
    /// Fallback models, tried in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
    /// Provider routing preferences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Value>,
}

impl OpenRouterOptions {
    /// The set options as body fields. Empty lists are dropped.
    pub fn into_extra(self) -> Map<String, Value> {
        let mut extra = Map::new();
        if let Some(tools) = self.tools.filter(|t| !t.is_empty()) {
            extra.insert("tools".into(), Value::Array(tools));
        }
        if let Some(choice) = self.tool_choice {
            extra.insert("tool_choice".into(), choice);
        }
        if let Some(format) = self.response_format {
            extra.insert("response_format".into(), format);
        }
        if let Some(transforms) = self.transforms.filter(|t| !t.is_empty()) {
            extra.insert("transforms".into(), transforms.into());
        }
        if let Some(models) = self.models.filter(|m| !m.is_empty()) {
            extra.insert("models".into(), models.into());
        }
        if let Some(provider) = self.provider {
            extra.insert("provider".into(), provider);
        }
        extra
    }

    /// Attach these options to `request`.
    pub fn apply(self, mut request: ChatRequest) -> ChatRequest {
        request.extra.extend(self.into_extra());
        request
    }
}

/// OpenRouter LLM provider.
pub struct OpenRouterProvider {
    transport: HttpTransport,
    headers: RequestHeaders,
    model: String,
    defaults: GenerationDefaults,
}

impl OpenRouterProvider {
    pub fn new(settings: OpenRouterSettings) -> Result<Self, ProviderError> {
        let headers = Self::build_headers(&settings);
        let retry = RetryPolicy::new(settings.max_retries, settings.retry_delay);
        let transport = HttpTransport::new(settings.base_url, &headers, settings.timeout, retry)?;

        Ok(Self {
            transport,
            headers,
            model: settings.model,
            defaults: GenerationDefaults {
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
            },
        })
    }

    fn build_headers(settings: &OpenRouterSettings) -> RequestHeaders {
        let mut headers = RequestHeaders::bearer(settings.api_key.expose_secret());
        if let Some(referer) = &settings.http_referer {
            headers.insert("HTTP-Referer", referer.as_str());
        }
        if let Some(title) = &settings.x_title {
            headers.insert("X-Title", title.as_str());
        }
        headers
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.transport.retry_policy()
    }

    /// Chat completion with OpenRouter-specific features.
    pub async fn chat_completion_with(
        &self,
        request: ChatRequest,
        options: OpenRouterOptions,
    ) -> Result<Value, ProviderError> {
        self.chat_completion(&options.apply(request)).await
    }

    /// `GET /models`: every model available through OpenRouter.
    pub async fn list_models(&self) -> Result<Value, ProviderError> {
        self.call_api(MODELS_ENDPOINT, HttpMethod::Get, None).await
    }

    /// `GET /models/{author}/{slug}/endpoints`.
    pub async fn get_model_endpoints(&self, author: &str, slug: &str) -> Result<Value, ProviderError> {
        if author.trim().is_empty() || slug.trim().is_empty() {
            return Err(ProviderError::configuration("Author and slug are required"));
        }
        let endpoint = format!("{MODELS_ENDPOINT}/{author}/{slug}/endpoints");
        self.call_api(&endpoint, HttpMethod::Get, None).await
    }

    /// `GET /credits`: remaining account credit.
    pub async fn get_credits(&self) -> Result<Value, ProviderError> {
        self.call_api(CREDITS_ENDPOINT, HttpMethod::Get, None).await
    }
}

impl ApiProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    fn defaults(&self) -> GenerationDefaults {
        self.defaults
    }

    fn limits(&self) -> GenerationLimits {
        OPENROUTER_LIMITS
    }

    async fn call_api(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        self.transport.request(endpoint, method, payload).await
    }

    async fn health_check(&self) -> bool {
        match self.list_models().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "openrouter health check failed");
                false
            }
        }
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        let params = resolve_parameters(request, self.defaults, &OPENROUTER_LIMITS)?;
        let body = build_chat_body(request, &self.model, params, false);

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.name(),
            gen_ai.request.model = body["model"].as_str(),
            gen_ai.request.max_tokens = params.max_tokens,
            gen_ai.request.temperature = params.temperature,
            gen_ai.request.stream = false,
        );
        self.call_api(CHAT_ENDPOINT, HttpMethod::Post, Some(&body))
            .instrument(span)
            .await
    }
}
