//! Blocking convenience wrapper over the async query path.
//!
//! Must not be called from inside a Tokio runtime; async callers should
//! `await` [`BoxApiProvider::query`] directly.

use deepcision_types::error::ProviderError;

use super::box_provider::BoxApiProvider;

/// Run `provider.query(prompt)` to completion on a private current-thread runtime.
///
/// Returns a `Configuration` error when called from within a runtime instead
/// of panicking.
pub fn query_blocking(provider: &BoxApiProvider, prompt: &str) -> Result<String, ProviderError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ProviderError::configuration(
            "query_blocking cannot run inside an async runtime; await `query` instead",
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ProviderError::configuration(format!("failed to start runtime: {e}")))?;
    runtime.block_on(provider.query(prompt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::tests::EchoProvider;

    #[test]
    fn test_query_blocking_outside_runtime() {
        let provider = BoxApiProvider::new(EchoProvider::new("echo"));
        assert_eq!(query_blocking(&provider, "hello").unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_query_blocking_inside_runtime_is_rejected() {
        let provider = BoxApiProvider::new(EchoProvider::new("echo"));
        let err = query_blocking(&provider, "hello").unwrap_err();
        assert!(matches!(err, ProviderError::Configuration { .. }));
    }
}
