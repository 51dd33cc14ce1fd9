//! Web search back-ends.
//!
//! Only Tavily is supported. The client shares the provider HTTP transport
//! but makes a single attempt per call.

pub mod tavily;

pub use tavily::{ExtractDepth, SearchDepth, SearchRequest, SearchTopic, TavilyClient, TimeRange};
