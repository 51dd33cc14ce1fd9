//! Generation parameter validation shared by all providers.

use std::ops::RangeInclusive;

use deepcision_types::error::ProviderError;
use deepcision_types::llm::{ChatRequest, GenerationDefaults, Message};

/// Temperature range accepted by every supported backend.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;

/// Provider-defined bounds for `max_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationLimits {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

impl GenerationLimits {
    pub const fn new(min_tokens: u32, max_tokens: u32) -> Self {
        Self {
            min_tokens,
            max_tokens,
        }
    }

    pub fn contains(&self, max_tokens: u32) -> bool {
        (self.min_tokens..=self.max_tokens).contains(&max_tokens)
    }
}

/// Clamp a temperature into [`TEMPERATURE_RANGE`]. NaN maps to the lower bound.
pub fn clamp_temperature(temperature: f64) -> f64 {
    if temperature.is_nan() {
        return *TEMPERATURE_RANGE.start();
    }
    temperature.clamp(*TEMPERATURE_RANGE.start(), *TEMPERATURE_RANGE.end())
}

/// Reject `max_tokens` outside the provider's limits.
pub fn validate_max_tokens(max_tokens: u32, limits: &GenerationLimits) -> Result<u32, ProviderError> {
    if limits.contains(max_tokens) {
        Ok(max_tokens)
    } else {
        Err(ProviderError::configuration(format!(
            "max_tokens must be between {} and {}, got {max_tokens}",
            limits.min_tokens, limits.max_tokens
        )))
    }
}

pub fn validate_messages(messages: &[Message]) -> Result<(), ProviderError> {
    if messages.is_empty() {
        return Err(ProviderError::configuration("Messages cannot be empty"));
    }
    Ok(())
}

/// Temperature and max_tokens ready to put on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedParameters {
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Validate a request and fill unset parameters from provider defaults.
///
/// Runs before any I/O; every failure is a `Configuration` error.
pub fn resolve_parameters(
    request: &ChatRequest,
    defaults: GenerationDefaults,
    limits: &GenerationLimits,
) -> Result<ResolvedParameters, ProviderError> {
    validate_messages(&request.messages)?;
    let temperature = clamp_temperature(request.temperature.unwrap_or(defaults.temperature));
    let max_tokens = validate_max_tokens(request.max_tokens.unwrap_or(defaults.max_tokens), limits)?;
    Ok(ResolvedParameters {
        temperature,
        max_tokens,
    })
}
