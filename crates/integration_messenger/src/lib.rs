//! Messenger Platform integration
//!
//! Sends messages through the Graph API Send API and validates webhook hub
//! signatures.
//!
//! # Architecture
//!
//! [`MessengerClient`] turns a [`Message`] into a JSON or multipart request
//! body, attaches the cached [`AuthParams`] and hands the request to a
//! [`Transport`]. [`HttpTransport`] is the `reqwest` implementation; tests and
//! embedders can supply their own.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_messenger::{MessengerClient, MessengerConfig, SenderAction};
//!
//! let config = MessengerConfig::new(page_token).with_app_secret(app_secret);
//! let client = MessengerClient::new(config)?;
//!
//! client.send_action("1234", SenderAction::TypingOn).await?;
//! client.send_text_message("1234", "Hello!").await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod signature;
pub mod transport;

pub use auth::{AuthContext, AuthParams};
pub use client::{MessengerClient, UserInfo};
pub use config::{DEFAULT_API_VERSION, DEFAULT_GRAPH_HOST, MessengerConfig};
pub use error::MessengerError;
pub use payload::{AttachmentKind, Message, SenderAction};
pub use signature::{HashAlgorithm, appsecret_proof, sign, verify_hub_signature};
pub use transport::{
    FilePart, GraphRequest, GraphResponse, HttpTransport, MultipartBody, RequestBody, Transport,
};
