//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use deepcision_types::error::ProviderError;

use super::response::{ApiErrorDetail, ApiResponse};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure reported by an LLM provider.
    Provider(ProviderError),
    /// No provider registered under this name.
    UnknownProvider(String),
    /// No role loaded under this name.
    UnknownRole(String),
    /// Request validation error.
    Validation(String),
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::Provider(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Provider(ProviderError::Configuration { .. }) => StatusCode::BAD_REQUEST,
            AppError::Provider(ProviderError::Authentication { .. }) => StatusCode::UNAUTHORIZED,
            AppError::Provider(ProviderError::Api {
                status_code: Some(429),
                ..
            }) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Provider(ProviderError::Api { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Provider(ProviderError::Network { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Provider(ProviderError::Response { .. }) => StatusCode::BAD_GATEWAY,
            AppError::UnknownProvider(_) | AppError::UnknownRole(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn detail(&self) -> ApiErrorDetail {
        let (code, message, details) = match self {
            AppError::Provider(e) => (
                e.code().to_uppercase(),
                e.message().to_string(),
                e.raw_body().cloned(),
            ),
            AppError::UnknownProvider(name) => (
                "PROVIDER_NOT_FOUND".to_string(),
                format!("Provider '{name}' is not configured"),
                None,
            ),
            AppError::UnknownRole(name) => (
                "ROLE_NOT_FOUND".to_string(),
                format!("Role '{name}' not found"),
                None,
            ),
            AppError::Validation(msg) => ("VALIDATION_ERROR".to_string(), msg.clone(), None),
        };
        ApiErrorDetail {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = ?self, "request failed");
        }
        let envelope = ApiResponse::error(self.detail(), uuid::Uuid::now_v7().to_string());
        let mut response = envelope.into_response();
        *response.status_mut() = status;
        response
    }
}
