//! Shared HTTP transport for provider clients.
//!
//! Owns the reqwest client with default headers baked in at construction,
//! the retry loop for rate-limited requests, status-code classification and
//! the SSE reader used for streaming completions.

use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_eventsource::{Event, EventSource};
use serde_json::{Value, json};

use deepcision_core::llm::provider::RequestHeaders;
use deepcision_types::error::ProviderError;
use deepcision_types::llm::HttpMethod;

/// Boxed stream of parsed SSE `data:` payloads.
pub type JsonStream = Pin<Box<dyn Stream<Item = Result<Value, ProviderError>> + Send + 'static>>;

/// Bounded, linear retry on HTTP 429.
///
/// `max_retries` is the total number of attempts; `delay` is slept between
/// consecutive rate-limited attempts. Other failures are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// One attempt, no retry.
    pub const fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Map a transport-level reqwest failure to `Network`.
pub fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::network("Request timed out")
    } else {
        ProviderError::network(format!("Network request failed: {err}"))
    }
}

/// Classify a non-success response.
///
/// The body is parsed as JSON, falling back to `{"error": "Unknown error"}`;
/// the message comes from `error.message` when present.
pub fn classify_error(status: u16, body: &str) -> ProviderError {
    let parsed: Value =
        serde_json::from_str(body).unwrap_or_else(|_| json!({ "error": "Unknown error" }));

    let message = parsed
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| match parsed.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => parsed.to_string(),
        });

    match status {
        401 => ProviderError::Authentication {
            message: "Invalid API key".to_string(),
            status_code: Some(status),
            body: Some(parsed),
        },
        402 => ProviderError::api("Insufficient credits", Some(status), Some(parsed)),
        429 => ProviderError::api("Rate limit exceeded", Some(status), Some(parsed)),
        _ => ProviderError::api(
            format!("API request failed: {message}"),
            Some(status),
            Some(parsed),
        ),
    }
}

fn header_map(headers: &RequestHeaders) -> Result<HeaderMap, ProviderError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProviderError::configuration(format!("invalid header name '{name}': {e}")))?;
        let mut header_value = HeaderValue::from_str(value)
            .map_err(|e| ProviderError::configuration(format!("invalid value for header '{name}': {e}")))?;
        if header_name == reqwest::header::AUTHORIZATION {
            header_value.set_sensitive(true);
        }
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// HTTP client bound to one provider's base URL, headers and retry policy.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Build the client. Headers are converted once here and sent with every request.
    pub fn new(
        base_url: impl Into<String>,
        headers: &RequestHeaders,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .default_headers(header_map(headers)?)
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn builder(&self, endpoint: &str, method: HttpMethod, payload: Option<&Value>) -> reqwest::RequestBuilder {
        let url = self.url(endpoint);
        let builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };
        match payload {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    /// Send one logical request, retrying rate-limited attempts.
    pub async fn request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        payload: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        let mut remaining = self.retry.max_retries;

        while remaining > 0 {
            tracing::debug!(%method, endpoint, remaining, "sending provider request");
            let response = self
                .builder(endpoint, method, payload)
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status();
            if status.is_success() {
                let text = response.text().await.map_err(map_transport_error)?;
                return serde_json::from_str(&text).map_err(|e| {
                    ProviderError::response(
                        format!("failed to parse response body: {e}"),
                        Some(Value::String(text)),
                    )
                });
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                remaining -= 1;
                if remaining > 0 {
                    tracing::warn!(
                        endpoint,
                        remaining,
                        delay_ms = self.retry.delay.as_millis() as u64,
                        "rate limited, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    continue;
                }
            }

            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body));
        }

        Err(ProviderError::api("Max retries exceeded", None, None))
    }

    /// POST `payload` and read the response as server-sent events.
    ///
    /// Yields each `data:` payload parsed as JSON and ends at `[DONE]`. A
    /// non-success status is classified like [`classify_error`]. No retry.
    pub fn stream(&self, endpoint: &str, payload: Value) -> JsonStream {
        let builder = self.builder(endpoint, HttpMethod::Post, Some(&payload));

        Box::pin(async_stream::try_stream! {
            let mut source = EventSource::new(builder).map_err(|e| {
                ProviderError::configuration(format!("request cannot be streamed: {e}"))
            })?;

            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => {
                        let data = message.data.trim();
                        if data == "[DONE]" {
                            break;
                        }
                        if data.is_empty() {
                            continue;
                        }
                        let chunk: Value = serde_json::from_str(data).map_err(|e| {
                            ProviderError::response(
                                format!("malformed stream chunk: {e}"),
                                Some(Value::String(data.to_string())),
                            )
                        })?;
                        yield chunk;
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                        let body = response.text().await.unwrap_or_default();
                        Err(classify_error(status.as_u16(), &body))?
                    }
                    Err(reqwest_eventsource::Error::Transport(e)) => Err(map_transport_error(e))?,
                    Err(other) => Err(ProviderError::network(format!("stream failed: {other}")))?,
                }
            }

            source.close();
        })
    }
}
