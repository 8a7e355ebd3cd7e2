//! Transport error type.

use crate::errors::RetryableError;
use thiserror::Error;

/// Errors raised while exchanging a request with the remote service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Error encoding the request query.
    #[error("Error building request URL: {0}")]
    BuildRequestUrl(#[source] serde_urlencoded::ser::Error),

    /// Failed to send HTTP request (connection, TLS, timeout).
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// Response body is not the expected JSON document.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),

    /// A successful response lacks a field the client relies on.
    #[error("Response is missing required field '{field}'")]
    MissingField { field: &'static str },
}

impl RetryableError for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            TransportError::HttpRequest(_) | TransportError::ReadBody(_) => true,
            TransportError::BuildHttpClient(_)
            | TransportError::BuildRequestUrl(_)
            | TransportError::DeserializeJson(_)
            | TransportError::MissingField { .. } => false,
        }
    }
}
