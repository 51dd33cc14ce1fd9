//! BoxApiProvider -- object-safe dynamic dispatch wrapper for ApiProvider.
//!
//! 1. Define an object-safe `ApiProviderDyn` trait with boxed futures
//! 2. Blanket-impl `ApiProviderDyn` for all `T: ApiProvider`
//! 3. `BoxApiProvider` wraps `Box<dyn ApiProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use deepcision_types::error::ProviderError;
use deepcision_types::llm::{ChatOverrides, ChatRequest, GenerationDefaults, HttpMethod, ProviderKind};

use super::params::GenerationLimits;
use super::provider::{ApiProvider, RequestHeaders};
use crate::agent::Agent;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`ApiProvider`] with boxed futures.
///
/// A blanket implementation is provided for all types implementing `ApiProvider`.
pub trait ApiProviderDyn: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ProviderKind;
    fn model(&self) -> &str;
    fn headers(&self) -> &RequestHeaders;
    fn defaults(&self) -> GenerationDefaults;
    fn limits(&self) -> GenerationLimits;
    fn format_response(&self, raw: &Value) -> Result<String, ProviderError>;

    fn call_api_boxed<'a>(
        &'a self,
        endpoint: &'a str,
        method: HttpMethod,
        payload: Option<&'a Value>,
    ) -> BoxFuture<'a, Result<Value, ProviderError>>;

    fn health_check_boxed(&self) -> BoxFuture<'_, bool>;

    fn chat_completion_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<Value, ProviderError>>;

    fn query_boxed<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>>;

    fn chat_boxed<'a>(
        &'a self,
        prompt: &'a str,
        agent: &'a Agent,
        overrides: &'a ChatOverrides,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

impl<T: ApiProvider> ApiProviderDyn for T {
    fn name(&self) -> &str {
        ApiProvider::name(self)
    }

    fn kind(&self) -> ProviderKind {
        ApiProvider::kind(self)
    }

    fn model(&self) -> &str {
        ApiProvider::model(self)
    }

    fn headers(&self) -> &RequestHeaders {
        ApiProvider::headers(self)
    }

    fn defaults(&self) -> GenerationDefaults {
        ApiProvider::defaults(self)
    }

    fn limits(&self) -> GenerationLimits {
        ApiProvider::limits(self)
    }

    fn format_response(&self, raw: &Value) -> Result<String, ProviderError> {
        ApiProvider::format_response(self, raw)
    }

    fn call_api_boxed<'a>(
        &'a self,
        endpoint: &'a str,
        method: HttpMethod,
        payload: Option<&'a Value>,
    ) -> BoxFuture<'a, Result<Value, ProviderError>> {
        Box::pin(self.call_api(endpoint, method, payload))
    }

    fn health_check_boxed(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.health_check())
    }

    fn chat_completion_boxed<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<Value, ProviderError>> {
        Box::pin(self.chat_completion(request))
    }

    fn query_boxed<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.query(prompt))
    }

    fn chat_boxed<'a>(
        &'a self,
        prompt: &'a str,
        agent: &'a Agent,
        overrides: &'a ChatOverrides,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.chat(prompt, agent, overrides))
    }
}

/// Type-erased provider for runtime selection by name.
///
/// Since `ApiProvider` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxApiProvider` exposes the same operations and delegates to
/// the inner `ApiProviderDyn` trait object.
pub struct BoxApiProvider {
    inner: Box<dyn ApiProviderDyn + Send + Sync>,
}

impl BoxApiProvider {
    pub fn new<T: ApiProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn kind(&self) -> ProviderKind {
        self.inner.kind()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    pub fn headers(&self) -> &RequestHeaders {
        self.inner.headers()
    }

    pub fn defaults(&self) -> GenerationDefaults {
        self.inner.defaults()
    }

    pub fn limits(&self) -> GenerationLimits {
        self.inner.limits()
    }

    pub fn format_response(&self, raw: &Value) -> Result<String, ProviderError> {
        self.inner.format_response(raw)
    }

    pub async fn call_api(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        self.inner.call_api_boxed(endpoint, method, payload).await
    }

    pub async fn health_check(&self) -> bool {
        self.inner.health_check_boxed().await
    }

    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        self.inner.chat_completion_boxed(request).await
    }

    pub async fn query(&self, prompt: &str) -> Result<String, ProviderError> {
        self.inner.query_boxed(prompt).await
    }

    pub async fn chat(
        &self,
        prompt: &str,
        agent: &Agent,
        overrides: &ChatOverrides,
    ) -> Result<String, ProviderError> {
        self.inner.chat_boxed(prompt, agent, overrides).await
    }
}
