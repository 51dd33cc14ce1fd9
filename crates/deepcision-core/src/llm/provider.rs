//! ApiProvider trait definition.
//!
//! This is the contract every backend implements. Uses RPITIT for the async
//! operations; `query`, `chat` and `format_response` have default bodies
//! built on `chat_completion` so a backend only supplies transport and
//! wire-format specifics.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use deepcision_types::error::ProviderError;
use deepcision_types::llm::{
    ChatOverrides, ChatRequest, GenerationDefaults, HttpMethod, Message, ProviderKind,
};

use super::compose::compose_role_request;
use super::params::GenerationLimits;
use crate::agent::Agent;

/// Headers sent with every request, computed once at provider construction.
///
/// `Debug` redacts the `Authorization` value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders(BTreeMap<String, String>);

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bearer(token: &str) -> Self {
        let mut headers = Self::new();
        headers.insert("Authorization", format!("Bearer {token}"));
        headers.insert("Content-Type", "application/json");
        headers
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RequestHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(k, v)| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "[REDACTED]")
                } else {
                    (k.as_str(), v.as_str())
                }
            }))
            .finish()
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
pub fn extract_content(raw: &Value) -> Result<String, ProviderError> {
    raw.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| {
            ProviderError::response(
                "Response is missing choices[0].message.content",
                Some(raw.clone()),
            )
        })
}

/// Trait for LLM provider backends (DeepSeek, OpenRouter).
///
/// Implementations live in deepcision-infra.
pub trait ApiProvider: Send + Sync {
    /// Registry name (e.g., "deepseek").
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Model used when a request does not name one.
    fn model(&self) -> &str;

    /// Headers computed at construction.
    fn headers(&self) -> &RequestHeaders;

    fn defaults(&self) -> GenerationDefaults;

    fn limits(&self) -> GenerationLimits;

    /// Perform one logical HTTP exchange against `endpoint`.
    ///
    /// Includes the provider's retry policy. Transport failures map to
    /// `Network`, non-success statuses to the classified error kinds.
    fn call_api(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
    ) -> impl std::future::Future<Output = Result<Value, ProviderError>> + Send;

    /// Lightweight authenticated probe. Never errors.
    fn health_check(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Validate `request`, build the wire body and return the raw response.
    fn chat_completion(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<Value, ProviderError>> + Send;

    /// Extract the generated text from a raw response body.
    fn format_response(&self, raw: &Value) -> Result<String, ProviderError> {
        extract_content(raw)
    }

    /// Single user message with provider defaults, returned as text.
    fn query(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, ProviderError>> + Send {
        async move {
            let request = ChatRequest::new(vec![Message::user(prompt)]);
            let raw = self.chat_completion(&request).await?;
            self.format_response(&raw)
        }
    }

    /// Speak `prompt` through `agent`'s role.
    ///
    /// Non-concurrent roles hold the agent's turn for the whole exchange.
    fn chat(
        &self,
        prompt: &str,
        agent: &Agent,
        overrides: &ChatOverrides,
    ) -> impl std::future::Future<Output = Result<String, ProviderError>> + Send {
        async move {
            if prompt.trim().is_empty() {
                return Err(ProviderError::configuration("Prompt and role are required"));
            }

            let _turn = agent.turn().await;
            if !agent.is_active() {
                return Err(ProviderError::configuration(format!(
                    "agent {} has been terminated",
                    agent.id()
                )));
            }

            tracing::debug!(
                provider = self.name(),
                agent_id = %agent.id(),
                role = %agent.role().name,
                "dispatching role chat"
            );
            let request = compose_role_request(agent.role(), prompt, overrides);
            let raw = self.chat_completion(&request).await?;
            self.format_response(&raw)
        }
    }
}
