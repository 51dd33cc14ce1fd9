use serde_json::Value;
use thiserror::Error;

/// Errors raised by LLM providers.
///
/// Every variant carries a human-readable message. HTTP-originated variants
/// also carry the status code and the parsed error body for introspection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Invalid parameters or credentials, detected before any I/O.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The backend rejected the credentials (HTTP 401).
    #[error("authentication error: {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
        body: Option<Value>,
    },

    /// Generic backend failure, including rate limiting and insufficient credit.
    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        body: Option<Value>,
    },

    /// Transport failure or timeout.
    #[error("network error: {message}")]
    Network { message: String },

    /// A 200 response that could not be turned into the expected shape.
    #[error("response error: {message}")]
    Response { message: String, body: Option<Value> },
}

impl ProviderError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ProviderError::Configuration {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ProviderError::Network {
            message: message.into(),
        }
    }

    pub fn response(message: impl Into<String>, body: Option<Value>) -> Self {
        ProviderError::Response {
            message: message.into(),
            body,
        }
    }

    pub fn api(message: impl Into<String>, status_code: Option<u16>, body: Option<Value>) -> Self {
        ProviderError::Api {
            message: message.into(),
            status_code,
            body,
        }
    }

    /// The bare message, without the kind prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Configuration { message }
            | ProviderError::Authentication { message, .. }
            | ProviderError::Api { message, .. }
            | ProviderError::Network { message }
            | ProviderError::Response { message, .. } => message,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Authentication { status_code, .. }
            | ProviderError::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// The parsed error body returned by the backend, if any.
    pub fn raw_body(&self) -> Option<&Value> {
        match self {
            ProviderError::Authentication { body, .. }
            | ProviderError::Api { body, .. }
            | ProviderError::Response { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Stable snake_case code for API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::Configuration { .. } => "configuration_error",
            ProviderError::Authentication { .. } => "authentication_error",
            ProviderError::Api { .. } => "api_error",
            ProviderError::Network { .. } => "network_error",
            ProviderError::Response { .. } => "response_error",
        }
    }
}

/// Errors in a role's prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}', only {{question}} is allowed")]
    UnknownPlaceholder(String),

    #[error("template has no {{question}} placeholder")]
    MissingQuestion,

    #[error("unbalanced '{brace}' at byte {position}")]
    UnbalancedBrace { brace: char, position: usize },
}

/// Errors related to role definitions and role template loading.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("failed to read role templates: {0}")]
    Read(String),

    #[error("malformed role templates: {0}")]
    Parse(String),

    #[error("invalid role '{name}': {reason}")]
    InvalidRole { name: String, reason: String },
}

/// Errors from the tokenizer registry and back-ends.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// Unknown tokenizer name or invalid options.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying encoding library failed.
    #[error("tokenizer backend error: {0}")]
    Backend(String),
}

/// Errors loading application configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("failed to write config file '{path}': {message}")]
    Write { path: String, message: String },

    #[error("unsupported config format: '{0}'")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::api("Insufficient credits", Some(402), None);
        assert_eq!(err.to_string(), "API error: Insufficient credits");
        assert_eq!(err.message(), "Insufficient credits");
        assert_eq!(err.status_code(), Some(402));
    }

    #[test]
    fn test_provider_error_accessors() {
        let body = serde_json::json!({"error": {"message": "bad key"}});
        let err = ProviderError::Authentication {
            message: "Invalid API key".into(),
            status_code: Some(401),
            body: Some(body.clone()),
        };
        assert_eq!(err.raw_body(), Some(&body));
        assert_eq!(err.code(), "authentication_error");

        let err = ProviderError::network("Request timed out");
        assert_eq!(err.status_code(), None);
        assert!(err.raw_body().is_none());
    }

    #[test]
    fn test_template_error_display() {
        let err = TemplateError::UnknownPlaceholder("topic".into());
        assert_eq!(
            err.to_string(),
            "unknown placeholder '{topic}', only {question} is allowed"
        );
        assert_eq!(
            TemplateError::MissingQuestion.to_string(),
            "template has no {question} placeholder"
        );
    }

    #[test]
    fn test_tokenizer_error_display() {
        let err = TokenizerError::InvalidArgument("Tokenizer 'x' not found".into());
        assert_eq!(err.to_string(), "invalid argument: Tokenizer 'x' not found");
    }
}
