//! Shared domain types for Deepcision.
//!
//! Provider configuration, role definitions, chat wire types and the error
//! taxonomy shared by every provider.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod role;
