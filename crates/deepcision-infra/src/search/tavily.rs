//! Tavily search and content extraction client.

use std::ops::RangeInclusive;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use deepcision_core::llm::provider::RequestHeaders;
use deepcision_types::error::ProviderError;
use deepcision_types::llm::HttpMethod;

use crate::config::TavilySettings;
use crate::llm::transport::{HttpTransport, RetryPolicy};

/// Accepted `max_results` values.
pub const MAX_RESULTS_RANGE: RangeInclusive<u32> = 1..=19;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    #[default]
    General,
    News,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[serde(alias = "d")]
    Day,
    #[serde(alias = "w")]
    Week,
    #[serde(alias = "m")]
    Month,
    #[serde(alias = "y")]
    Year,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractDepth {
    #[default]
    Basic,
    Advanced,
}

/// Parameters for [`TavilyClient::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub topic: SearchTopic,
    #[serde(default)]
    pub search_depth: SearchDepth,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Days back, for the news topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default)]
    pub include_answer: bool,
    #[serde(default)]
    pub include_raw_content: bool,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub include_image_descriptions: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_domains: Vec<String>,
}

fn default_max_results() -> u32 {
    5
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            topic: SearchTopic::default(),
            search_depth: SearchDepth::default(),
            max_results: default_max_results(),
            time_range: None,
            days: None,
            include_answer: false,
            include_raw_content: false,
            include_images: false,
            include_image_descriptions: false,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_topic(mut self, topic: SearchTopic) -> Self {
        self.topic = topic;
        self
    }

    pub fn with_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if !MAX_RESULTS_RANGE.contains(&self.max_results) {
            return Err(ProviderError::configuration(
                "max_results must be between 1 and 19",
            ));
        }
        if self.days == Some(0) {
            return Err(ProviderError::configuration("days must be greater than 0"));
        }
        Ok(())
    }
}

/// Client for the Tavily search API.
pub struct TavilyClient {
    transport: HttpTransport,
}

impl TavilyClient {
    pub fn new(settings: TavilySettings) -> Result<Self, ProviderError> {
        let headers = RequestHeaders::bearer(settings.api_key.expose_secret());
        let transport = HttpTransport::new(
            settings.base_url,
            &headers,
            settings.timeout,
            RetryPolicy::single_attempt(),
        )?;
        Ok(Self { transport })
    }

    /// Run a web search.
    pub async fn search(&self, request: &SearchRequest) -> Result<Value, ProviderError> {
        request.validate()?;
        let body = serde_json::to_value(request)
            .map_err(|e| ProviderError::configuration(format!("invalid search request: {e}")))?;
        tracing::debug!(query = %request.query, max_results = request.max_results, "tavily search");
        self.transport.request("/search", HttpMethod::Post, Some(&body)).await
    }

    /// Extract page content from one or more URLs.
    pub async fn extract(
        &self,
        urls: &[String],
        include_images: bool,
        depth: ExtractDepth,
    ) -> Result<Value, ProviderError> {
        if urls.is_empty() {
            return Err(ProviderError::configuration("at least one URL is required"));
        }
        let body = json!({
            "urls": urls,
            "include_images": include_images,
            "extract_depth": depth,
        });
        tracing::debug!(urls = urls.len(), "tavily extract");
        self.transport.request("/extract", HttpMethod::Post, Some(&body)).await
    }
}
