//! Messenger error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the Messenger Platform
#[derive(Debug, Error)]
pub enum MessengerError {
    /// The HTTP request could not be completed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The transport gave up waiting for a response
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },

    /// The requested object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access token or app secret proof was rejected (HTTP 401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The Graph API failed on its side (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Error message reported by the API
        message: String,
    },

    /// Any other non-success response
    #[error("API error ({status}): {code} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Graph API error code, 0 if the body carried none
        code: i64,
        /// Error message reported by the API
        message: String,
    },

    /// A success response carried an unexpected body
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A local attachment could not be read
    #[error("Cannot read attachment {}: {source}", .path.display())]
    FileAccess {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Unknown sender action name
    #[error("Invalid sender action: {0}")]
    InvalidSenderAction(String),

    /// Missing or invalid configuration
    #[error("Missing configuration: {0}")]
    Configuration(String),
}

impl MessengerError {
    /// Returns true if the caller may retry the request
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_)
                | Self::Timeout { .. }
                | Self::ServerError { .. }
                | Self::Api { status: 429, .. }
        )
    }
}
