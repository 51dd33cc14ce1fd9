//! Infrastructure layer for Deepcision.
//!
//! Implements the ports defined in `deepcision-core`: the DeepSeek and
//! OpenRouter providers over a shared retrying HTTP transport, file and
//! environment configuration, the JSON role-template loader, tokenizer
//! back-ends and the Tavily search client.

pub mod config;
pub mod llm;
pub mod roles;
pub mod search;
pub mod tokenizer;
