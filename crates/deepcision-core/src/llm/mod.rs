//! LLM provider abstractions for Deepcision.
//!
//! - `ApiProvider`: RPITIT trait for concrete provider implementations
//! - `BoxApiProvider`: Object-safe wrapper for dynamic dispatch
//! - `ApiManager`: name-keyed registry built from configuration at startup

pub mod blocking;
pub mod box_provider;
pub mod compose;
pub mod manager;
pub mod params;
pub mod provider;
