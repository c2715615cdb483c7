//! # Global client management
//!
//! The storefront and back-office views share one [`QueryClient`] for the whole
//! application lifetime. It is installed once at startup and read by the hooks.

use std::sync::OnceLock;

use crate::client::QueryClient;
use crate::config::ClientConfig;
use crate::transport::Transport;

/// Error type for global client operations
#[derive(Debug, thiserror::Error)]
pub enum GlobalClientError {
    #[error("Global client not initialized. Call init() first.")]
    NotInitialized,
    #[error("Failed to initialize global client: {0}")]
    InitializationFailed(String),
}

/// Global singleton instance of the query client
static GLOBAL_CLIENT: OnceLock<QueryClient> = OnceLock::new();

fn install(client: QueryClient) -> Result<&'static QueryClient, GlobalClientError> {
    GLOBAL_CLIENT.set(client).map_err(|_| {
        GlobalClientError::InitializationFailed("a global client is already installed".to_string())
    })?;
    get_global_client()
}

/// Initialize the global client over HTTP
///
/// ## Example
///
/// ```rust,no_run
/// use storefront_provider::config::ClientConfig;
/// use storefront_provider::global;
///
/// let config = ClientConfig::new("http://localhost:5000").with_env_overrides();
/// global::init(config).expect("client setup");
/// ```
pub fn init(config: ClientConfig) -> Result<&'static QueryClient, GlobalClientError> {
    config
        .validate()
        .map_err(|err| GlobalClientError::InitializationFailed(err.to_string()))?;
    let client = QueryClient::new(config)
        .map_err(|err| GlobalClientError::InitializationFailed(err.to_string()))?;
    install(client)
}

/// Initialize the global client over a custom transport
pub fn init_with_transport(
    config: ClientConfig,
    transport: impl Transport,
) -> Result<&'static QueryClient, GlobalClientError> {
    install(QueryClient::with_transport(config, transport))
}

/// Get the global client instance
///
/// ## Errors
///
/// Returns `GlobalClientError::NotInitialized` if `init()` has not been called yet.
pub fn get_global_client() -> Result<&'static QueryClient, GlobalClientError> {
    GLOBAL_CLIENT.get().ok_or(GlobalClientError::NotInitialized)
}

/// Check if the global client has been initialized
pub fn is_initialized() -> bool {
    GLOBAL_CLIENT.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiResult;
    use crate::transport::ApiRequest;
    use futures::future::BoxFuture;
    use serde_json::Value;

    struct NullTransport;

    impl Transport for NullTransport {
        fn send(&self, _request: ApiRequest) -> BoxFuture<'_, ApiResult<Value>> {
            Box::pin(async { Ok(Value::Null) })
        }
    }

    #[test]
    fn second_initialization_fails() {
        let config = ClientConfig::new("http://localhost:5000");
        let first = init_with_transport(config.clone(), NullTransport);
        if first.is_ok() {
            assert!(is_initialized());
        }
        let second = init_with_transport(config, NullTransport);
        assert!(matches!(
            second,
            Err(GlobalClientError::InitializationFailed(_))
        ));
        assert!(get_global_client().is_ok());
    }
}
