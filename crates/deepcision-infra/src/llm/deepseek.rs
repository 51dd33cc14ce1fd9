//! DeepSeekProvider -- [`ApiProvider`] for the DeepSeek chat API.
//!
//! Supports `deepseek-chat` and `deepseek-reasoner`. Requests go to
//! `/v1/chat/completions` with a single attempt (no rate-limit retry);
//! health is probed through `/v1/user/balance`.

use futures_util::StreamExt;
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{Instrument, info_span};

use deepcision_core::llm::params::{GenerationLimits, resolve_parameters};
use deepcision_core::llm::provider::{ApiProvider, RequestHeaders};
use deepcision_types::error::ProviderError;
use deepcision_types::llm::{ChatRequest, GenerationDefaults, HttpMethod, ProviderKind};

use super::transport::{HttpTransport, RetryPolicy};
use super::{TextStream, build_chat_body};
use crate::config::{DEEPSEEK_LIMITS, DeepSeekSettings};

const CHAT_ENDPOINT: &str = "/v1/chat/completions";
const BALANCE_ENDPOINT: &str = "/v1/user/balance";

/// DeepSeek LLM provider.
///
/// The API key only lives inside the precomputed `Authorization` header.
pub struct DeepSeekProvider {
    transport: HttpTransport,
    headers: RequestHeaders,
    model: String,
    defaults: GenerationDefaults,
}

// No Debug: the headers carry the bearer token.

impl DeepSeekProvider {
    pub fn new(settings: DeepSeekSettings) -> Result<Self, ProviderError> {
        let headers = Self::build_headers(&settings);
        let transport = HttpTransport::new(
            settings.base_url,
            &headers,
            settings.timeout,
            RetryPolicy::single_attempt(),
        )?;

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

    fn build_headers(settings: &DeepSeekSettings) -> RequestHeaders {
        RequestHeaders::bearer(settings.api_key.expose_secret())
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    fn body(&self, request: &ChatRequest, stream: bool) -> Result<Value, ProviderError> {
        let params = resolve_parameters(request, self.defaults, &DEEPSEEK_LIMITS)?;
        Ok(build_chat_body(request, &self.model, params, stream))
    }

    /// Stream the completion as text deltas.
    ///
    /// Validation failures surface as the first stream item.
    pub fn chat_stream(&self, request: &ChatRequest) -> TextStream {
        let body = match self.body(request, true) {
            Ok(body) => body,
            Err(e) => return Box::pin(futures_util::stream::once(async move { Err(e) })),
        };

        let chunks = self.transport.stream(CHAT_ENDPOINT, body);
        Box::pin(chunks.filter_map(|chunk| async move {
            match chunk {
                Ok(value) => value["choices"][0]["delta"]["content"]
                    .as_str()
                    .filter(|text| !text.is_empty())
                    .map(|text| Ok(text.to_string())),
                Err(e) => Some(Err(e)),
            }
        }))
    }
}

impl ApiProvider for DeepSeekProvider {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
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
        DEEPSEEK_LIMITS
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
        match self.call_api(BALANCE_ENDPOINT, HttpMethod::Get, None).await {
            Ok(balance) => {
                tracing::debug!(
                    available = balance.get("is_available").and_then(serde_json::Value::as_bool),
                    "deepseek balance check ok"
                );
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "deepseek health check failed");
                false
            }
        }
    }

    async fn chat_completion(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        let body = self.body(request, false)?;
        let span = info_span!(
            "gen_ai.chat",
            gen_ai.system = self.name(),
            gen_ai.request.model = body["model"].as_str(),
            gen_ai.request.max_tokens = body["max_tokens"].as_u64(),
            gen_ai.request.temperature = body["temperature"].as_f64(),
            gen_ai.request.stream = false,
        );
        self.call_api(CHAT_ENDPOINT, HttpMethod::Post, Some(&body))
            .instrument(span)
            .await
    }
}
