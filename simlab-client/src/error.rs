//! Error types for the simlab client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the simlab client
///
/// Three families matter to callers:
/// - transport errors (network, timeout, non-2xx) are worth retrying on
///   submissions;
/// - business failures (`success=false`, job reported as failed) are final;
/// - local errors (bad input, bad configuration, cancellation) never reached
///   or never depended on the server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Server answered `success=false`
    #[error("Request rejected: {message}")]
    Business {
        /// Message provided by the server
        message: String,
    },

    /// The job reached the failed state
    #[error("Job failed: {message}")]
    JobFailed {
        /// Job error reported by the server
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request, rejected before sending
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a local upload failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation observed a cancellation request
    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Create a business failure from a server message
    pub fn business(message: impl Into<String>) -> Self {
        Self::Business {
            message: message.into(),
        }
    }

    /// Check if this error is a transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::ApiError { .. })
    }

    /// Check if this error is an application-level failure
    pub fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. } | Self::JobFailed { .. })
    }

    /// Check if repeating the same request may succeed
    ///
    /// Only transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(ClientError::api_error(503, "unavailable").is_retryable());
        assert!(ClientError::api_error(404, "missing").is_retryable());
    }

    #[test]
    fn test_business_and_local_errors_are_final() {
        assert!(!ClientError::business("bad project").is_retryable());
        assert!(
            !ClientError::JobFailed {
                message: "boom".to_string()
            }
            .is_retryable()
        );
        assert!(!ClientError::ParseError("eof".to_string()).is_retryable());
        assert!(!ClientError::InvalidRequest("empty".to_string()).is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
    }

    #[test]
    fn test_status_classification() {
        let not_found = ClientError::api_error(404, "missing");
        assert!(not_found.is_not_found());
        assert!(not_found.is_client_error());
        assert!(!not_found.is_server_error());

        let server = ClientError::api_error(502, "bad gateway");
        assert!(server.is_server_error());
        assert!(!server.is_business());
    }
}
