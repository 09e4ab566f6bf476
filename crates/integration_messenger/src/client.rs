//! Messenger Platform client
//!
//! Wraps the Graph API Send API and user profile lookups. Every request is
//! authenticated with `access_token` and, when an app secret is configured,
//! `appsecret_proof`.

use std::path::Path;
use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::auth::{AuthContext, AuthParams};
use crate::config::MessengerConfig;
use crate::error::MessengerError;
use crate::payload::{AttachmentKind, Message, SenderAction};
use crate::signature;
use crate::transport::{GraphRequest, GraphResponse, HttpTransport, RequestBody, Transport};

/// Path of the Send API relative to the versioned Graph URL
const MESSAGES_PATH: &str = "/me/messages";

/// User profile fields returned by the Graph API
pub type UserInfo = Map<String, Value>;

/// Graph API error response
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Client for the Messenger Platform
pub struct MessengerClient {
    graph_url: String,
    auth: AuthContext,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for MessengerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessengerClient")
            .field("graph_url", &self.graph_url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl MessengerClient {
    /// Create a client that talks to the Graph API over HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: MessengerConfig) -> Result<Self, MessengerError> {
        config.validate().map_err(MessengerError::Configuration)?;
        let transport = HttpTransport::new(config.timeout_secs)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client that sends requests through the given transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(
        config: MessengerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, MessengerError> {
        config.validate().map_err(MessengerError::Configuration)?;

        let graph_url = config.graph_url();
        let access_token = config
            .access_token
            .ok_or_else(|| MessengerError::Configuration("access_token is required".to_string()))?;

        debug!(graph_url = %graph_url, signed = config.app_secret.is_some(), "Created Messenger client");

        Ok(Self {
            graph_url,
            auth: AuthContext::new(access_token, config.app_secret),
            transport,
        })
    }

    /// Versioned Graph API root every relative path is resolved against
    #[must_use]
    pub fn graph_url(&self) -> &str {
        &self.graph_url
    }

    /// Authentication parameters attached to every request
    pub fn auth_params(&self) -> &AuthParams {
        self.auth.auth_params()
    }

    /// Resolve a path starting with `/` against [`Self::graph_url`]
    ///
    /// Anything else is returned unchanged.
    #[must_use]
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.graph_url)
        } else {
            path.to_string()
        }
    }

    /// Validate a webhook hub signature header with the configured app secret
    ///
    /// Always false when no app secret is configured.
    pub fn verify_hub_signature(&self, payload: &[u8], header: &str) -> bool {
        let Some(secret) = self.auth.app_secret() else {
            warn!("Cannot validate hub signature without an app secret");
            return false;
        };
        signature::verify_hub_signature(payload, header, secret)
    }

    /// Fetch a user's profile
    ///
    /// `fields` is sent comma-joined as the `fields` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::NotFound`] for unknown users,
    /// [`MessengerError::Unauthorized`] for rejected credentials and other
    /// variants for transport or server failures.
    #[instrument(skip(self))]
    pub async fn get_user_info(
        &self,
        user_id: &str,
        fields: Option<&[&str]>,
    ) -> Result<UserInfo, MessengerError> {
        let mut query = Vec::new();
        if let Some(fields) = fields {
            query.push(("fields".to_string(), fields.join(",")));
        }
        query.extend(self.auth_params().to_query());

        let resource = format!("/{user_id}");
        let request = GraphRequest {
            method: Method::GET,
            url: self.resolve_url(&resource),
            query,
            body: RequestBody::Empty,
        };

        let response = self.transport.execute(request).await?;
        match Self::parse_response(&response, &resource)? {
            Value::Object(info) => Ok(info),
            other => Err(MessengerError::ParseError(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Send any [`Message`] to a recipient
    ///
    /// # Errors
    ///
    /// Returns an error if a file attachment cannot be read, the request
    /// fails, or the API answers with a non-success status.
    #[instrument(skip(self, message), fields(kind = message.kind()))]
    pub async fn send(&self, recipient_id: &str, message: Message) -> Result<Value, MessengerError> {
        let body = message.into_body(recipient_id).await?;

        let request = GraphRequest {
            method: Method::POST,
            url: self.resolve_url(MESSAGES_PATH),
            query: self.auth_params().to_query(),
            body,
        };

        let response = self.transport.execute(request).await?;
        let result = Self::parse_response(&response, MESSAGES_PATH)?;
        debug!("Message sent");
        Ok(result)
    }

    /// Send a plain text message
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_text_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<Value, MessengerError> {
        self.send(recipient_id, Message::Text(text.to_string()))
            .await
    }

    /// Send an already shaped `message` object
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_message(
        &self,
        recipient_id: &str,
        message: Value,
    ) -> Result<Value, MessengerError> {
        self.send(recipient_id, Message::Custom(message)).await
    }

    /// Send a generic template
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_generic_message(
        &self,
        recipient_id: &str,
        elements: Vec<Value>,
    ) -> Result<Value, MessengerError> {
        self.send(recipient_id, Message::Generic { elements }).await
    }

    /// Send a button template
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_button_message(
        &self,
        recipient_id: &str,
        text: &str,
        buttons: Vec<Value>,
    ) -> Result<Value, MessengerError> {
        self.send(
            recipient_id,
            Message::Button {
                text: text.to_string(),
                buttons,
            },
        )
        .await
    }

    /// Send a typing indicator or read receipt
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_action(
        &self,
        recipient_id: &str,
        action: SenderAction,
    ) -> Result<Value, MessengerError> {
        self.send(recipient_id, Message::Action(action)).await
    }

    /// Send media the platform downloads from `url`
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_url_attachment(
        &self,
        recipient_id: &str,
        kind: AttachmentKind,
        url: &str,
    ) -> Result<Value, MessengerError> {
        self.send(
            recipient_id,
            Message::UrlAttachment {
                kind,
                url: url.to_string(),
            },
        )
        .await
    }

    /// Upload a local file as an attachment
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::FileAccess`] if the file cannot be read,
    /// otherwise see [`Self::send`].
    pub async fn send_file_attachment(
        &self,
        recipient_id: &str,
        kind: AttachmentKind,
        path: impl AsRef<Path>,
    ) -> Result<Value, MessengerError> {
        self.send(
            recipient_id,
            Message::FileAttachment {
                kind,
                path: path.as_ref().to_path_buf(),
            },
        )
        .await
    }

    /// Send an image by URL
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_image_url(&self, recipient_id: &str, url: &str) -> Result<Value, MessengerError> {
        self.send_url_attachment(recipient_id, AttachmentKind::Image, url)
            .await
    }

    /// Send audio by URL
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_audio_url(&self, recipient_id: &str, url: &str) -> Result<Value, MessengerError> {
        self.send_url_attachment(recipient_id, AttachmentKind::Audio, url)
            .await
    }

    /// Send a video by URL
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_video_url(&self, recipient_id: &str, url: &str) -> Result<Value, MessengerError> {
        self.send_url_attachment(recipient_id, AttachmentKind::Video, url)
            .await
    }

    /// Send a file by URL
    ///
    /// # Errors
    ///
    /// See [`Self::send`].
    pub async fn send_file_url(&self, recipient_id: &str, url: &str) -> Result<Value, MessengerError> {
        self.send_url_attachment(recipient_id, AttachmentKind::File, url)
            .await
    }

    /// Upload a local image
    ///
    /// # Errors
    ///
    /// See [`Self::send_file_attachment`].
    pub async fn send_image(
        &self,
        recipient_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<Value, MessengerError> {
        self.send_file_attachment(recipient_id, AttachmentKind::Image, path)
            .await
    }

    /// Upload a local audio file
    ///
    /// # Errors
    ///
    /// See [`Self::send_file_attachment`].
    pub async fn send_audio(
        &self,
        recipient_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<Value, MessengerError> {
        self.send_file_attachment(recipient_id, AttachmentKind::Audio, path)
            .await
    }

    /// Upload a local video
    ///
    /// # Errors
    ///
    /// See [`Self::send_file_attachment`].
    pub async fn send_video(
        &self,
        recipient_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<Value, MessengerError> {
        self.send_file_attachment(recipient_id, AttachmentKind::Video, path)
            .await
    }

    /// Upload a local file
    ///
    /// # Errors
    ///
    /// See [`Self::send_file_attachment`].
    pub async fn send_file(
        &self,
        recipient_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<Value, MessengerError> {
        self.send_file_attachment(recipient_id, AttachmentKind::File, path)
            .await
    }

    /// Map a raw response onto the error taxonomy and parse success bodies
    fn parse_response(response: &GraphResponse, resource: &str) -> Result<Value, MessengerError> {
        if response.is_success() {
            return serde_json::from_str(&response.body)
                .map_err(|e| MessengerError::ParseError(e.to_string()));
        }

        let (code, message) = serde_json::from_str::<ApiErrorResponse>(&response.body)
            .map_or_else(
                |_| (0, response.body.clone()),
                |error| (error.error.code, error.error.message),
            );

        warn!(
            status = response.status,
            code,
            message = %message,
            resource = %resource,
            "Graph API returned an error"
        );

        Err(match response.status {
            404 => MessengerError::NotFound(resource.to_string()),
            401 | 403 => MessengerError::Unauthorized(message),
            status @ 500..=599 => MessengerError::ServerError { status, message },
            status => MessengerError::Api {
                status,
                code,
                message,
            },
        })
    }
}
