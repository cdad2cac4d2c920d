//! Transport error types.
//!
//! These never escape [`RequestExecutor::execute`](super::RequestExecutor::execute):
//! the executor converts them into a failed
//! [`ExecutionResult`](crate::models::ExecutionResult) with status 0.

use thiserror::Error;

/// Errors that can occur while sending a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Connection failures, DNS resolution errors and other network issues.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The request did not complete within the timeout.
    #[error("Request timed out")]
    Timeout,

    /// The URL could not be used for a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Certificate validation or handshake failure.
    #[error("TLS/SSL error: {0}")]
    TlsError(String),

    /// The request could not be built, e.g. because of an invalid header name.
    #[error("Request build error: {0}")]
    BuildError(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::BuildError(message)
        } else if message.contains("certificate") || message.contains("TLS") || message.contains("SSL") {
            RequestError::TlsError(message)
        } else if err.is_connect() {
            RequestError::NetworkError(format!("Connection failed: {}", message))
        } else {
            RequestError::NetworkError(message)
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RequestError::NetworkError("Connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: Connection refused");
        assert_eq!(RequestError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            RequestError::InvalidUrl("not a url".to_string()).to_string(),
            "Invalid URL: not a url"
        );
    }

    #[test]
    fn test_from_url_parse_error() {
        let err: RequestError = url::Url::parse("no scheme").unwrap_err().into();
        assert!(matches!(err, RequestError::InvalidUrl(_)));
    }
}
