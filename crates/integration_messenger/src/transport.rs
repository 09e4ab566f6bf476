//! HTTP transport for Graph API requests
//!
//! [`MessengerClient`](crate::MessengerClient) builds a [`GraphRequest`] and
//! hands it to a [`Transport`]. The transport only moves bytes; interpreting
//! the status code is left to the client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use crate::error::MessengerError;

/// A fully resolved Graph API request
#[derive(Debug, Clone)]
pub struct GraphRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Query parameters in the order they are sent
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
}

impl GraphRequest {
    /// Look up a query parameter by name
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Body of a [`GraphRequest`]
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body (GET requests)
    Empty,
    /// `application/json` body
    Json(Value),
    /// `multipart/form-data` body for file uploads
    Multipart(MultipartBody),
}

/// The three parts of a file attachment upload
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartBody {
    /// Sent as the `recipient` part, JSON encoded
    pub recipient: Value,
    /// Sent as the `message` part, JSON encoded
    pub message: Value,
    /// Sent as the `filedata` part
    pub file: FilePart,
}

impl MultipartBody {
    fn into_form(self) -> Form {
        let file = Part::bytes(self.file.data).file_name(self.file.file_name);
        Form::new()
            .text("recipient", self.recipient.to_string())
            .text("message", self.message.to_string())
            .part("filedata", file)
    }
}

/// File contents read from a local path
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name reported in the part's content disposition
    pub file_name: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Status code and raw body of a Graph API response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl GraphResponse {
    /// Returns true for 2xx status codes
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs Graph API requests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the raw response
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed. Non-success
    /// status codes are not errors at this level.
    async fn execute(&self, request: GraphRequest) -> Result<GraphResponse, MessengerError>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout_secs: u64) -> Result<Self, MessengerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("integration_messenger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MessengerError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn map_error(&self, error: &reqwest::Error) -> MessengerError {
        if error.is_timeout() {
            MessengerError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            MessengerError::RequestFailed(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: GraphRequest) -> Result<GraphResponse, MessengerError> {
        debug!(method = %request.method, url = %request.url, "Sending Graph API request");

        let builder = self
            .client
            .request(request.method, &request.url)
            .query(&request.query);

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(body) => builder.multipart(body.into_form()),
        };

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(&e))?;

        debug!(status, body_len = body.len(), "Received Graph API response");

        Ok(GraphResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_success_range() {
        let response = |status| GraphResponse {
            status,
            body: String::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn query_param_lookup() {
        let request = GraphRequest {
            method: Method::GET,
            url: "https://graph.facebook.com/v6.0/42".to_string(),
            query: vec![
                ("fields".to_string(), "name".to_string()),
                ("access_token".to_string(), "T".to_string()),
            ],
            body: RequestBody::Empty,
        };
        assert_eq!(request.query_param("access_token"), Some("T"));
        assert_eq!(request.query_param("fields"), Some("name"));
        assert_eq!(request.query_param("appsecret_proof"), None);
    }

    #[test]
    fn file_part_debug_omits_contents() {
        let part = FilePart {
            file_name: "cat.png".to_string(),
            data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let debug = format!("{part:?}");
        assert!(debug.contains("cat.png"));
        assert!(debug.contains("len: 4"));
        assert!(!debug.contains("222"));
    }

    #[test]
    fn transport_builds_with_timeout() {
        assert!(HttpTransport::new(5).is_ok());
    }
}
