//! Error types for storefront-provider
//!
//! [`ApiError`] is the single error channel of every query and mutation. It keeps
//! the `{ status, data }` shape the backend produces so views can render the
//! backend's own message, and classifies failures for the few views that react
//! differently to a 403 or a 404.

use serde_json::Value;

/// Message shown when neither the backend nor the transport provided one
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Transport-level failure of a query or mutation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status (or `success: false`)
    #[error("HTTP {status}: {}", message_or_body(.data))]
    Http { status: u16, data: Value },
    /// The request never produced a response
    #[error("network request failed: {0}")]
    Fetch(String),
    /// The response body did not match the expected shape
    #[error("failed to parse response: {0}")]
    Parsing(String),
}

/// Coarse classification of an [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Client,
    Server,
    Network,
    Parsing,
}

fn message_or_body(data: &Value) -> String {
    match data.get("message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => data.to_string(),
    }
}

impl ApiError {
    /// The HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The response body of a failed request (`Value::Null` for non-HTTP failures)
    pub fn data(&self) -> &Value {
        match self {
            ApiError::Http { data, .. } => data,
            _ => &Value::Null,
        }
    }

    /// The backend-provided `data.message`, if any
    pub fn message(&self) -> Option<&str> {
        self.data()
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http { status: 401, .. } => ErrorKind::Unauthorized,
            ApiError::Http { status: 403, .. } => ErrorKind::Forbidden,
            ApiError::Http { status: 404, .. } => ErrorKind::NotFound,
            ApiError::Http { status, .. } if *status >= 500 => ErrorKind::Server,
            ApiError::Http { .. } => ErrorKind::Client,
            ApiError::Fetch(_) => ErrorKind::Network,
            ApiError::Parsing(_) => ErrorKind::Parsing,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        self.kind() == ErrorKind::Forbidden
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Text to show the user: the backend message, else the transport error, else `fallback`.
    /// Status codes are never mapped to messages client-side.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(message) = self.message() {
            return message.to_string();
        }
        match self {
            ApiError::Fetch(error) | ApiError::Parsing(error) if !error.is_empty() => error.clone(),
            ApiError::Http {
                data: Value::String(text),
                ..
            } if !text.trim().is_empty() => text.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Parsing(err.to_string())
        } else {
            ApiError::Fetch(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parsing(err.to_string())
    }
}

/// Result alias for transport-backed operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while loading or validating [`crate::config::ClientConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors raised by the client-side key/value stores
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Errors raised while exporting tables
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Export rows must be JSON objects, got: {0}")]
    InvalidRow(String),
}

/// Outcome of a form submission that did not produce a result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// Client-side validation blocked the submission; no request was sent
    #[error("form has {} invalid field(s)", .0.values().filter(|e| !e.is_empty()).count())]
    Invalid(crate::types::FieldErrors),
    /// A submission is already in flight
    #[error("form is already submitting")]
    InFlight,
    /// The request was sent and failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors raised by checkout flows combining local staging and the API
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("no items are staged for checkout")]
    NothingStaged,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_message_prefers_backend_message() {
        let err = ApiError::Http {
            status: 400,
            data: json!({ "message": "Product is out of stock" }),
        };
        assert_eq!(err.user_message("fallback"), "Product is out of stock");
    }

    #[test]
    fn user_message_falls_back_to_transport_error_then_generic() {
        let fetch = ApiError::Fetch("connection refused".into());
        assert_eq!(fetch.user_message("fallback"), "connection refused");

        let empty = ApiError::Http {
            status: 500,
            data: json!({ "message": "  " }),
        };
        assert_eq!(empty.user_message(GENERIC_ERROR_MESSAGE), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn classifies_forbidden_and_not_found() {
        let forbidden = ApiError::Http {
            status: 403,
            data: Value::Null,
        };
        let missing = ApiError::Http {
            status: 404,
            data: Value::Null,
        };
        assert!(forbidden.is_forbidden());
        assert!(missing.is_not_found());
        assert_eq!(ApiError::Fetch(String::new()).kind(), ErrorKind::Network);
        assert_eq!(
            ApiError::Http {
                status: 502,
                data: Value::Null
            }
            .kind(),
            ErrorKind::Server
        );
    }
}
