//! Send API payload construction
//!
//! Every builder here is pure except [`file_attachment`], which reads the
//! attachment from disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::MessengerError;
use crate::transport::{FilePart, MultipartBody, RequestBody};

/// Media type of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Video,
    File,
}

impl AttachmentKind {
    /// Value of the attachment's `type` field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typing indicators and read receipts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderAction {
    TypingOn,
    TypingOff,
    MarkSeen,
}

impl SenderAction {
    /// Value of the `sender_action` field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TypingOn => "typing_on",
            Self::TypingOff => "typing_off",
            Self::MarkSeen => "mark_seen",
        }
    }
}

impl fmt::Display for SenderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderAction {
    type Err = MessengerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "typing_on" => Ok(Self::TypingOn),
            "typing_off" => Ok(Self::TypingOff),
            "mark_seen" => Ok(Self::MarkSeen),
            other => Err(MessengerError::InvalidSenderAction(other.to_string())),
        }
    }
}

/// An outbound message intent
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Plain text
    Text(String),
    /// Generic template with a carousel of elements
    Generic {
        /// Template elements, passed through as-is
        elements: Vec<Value>,
    },
    /// Button template
    Button {
        /// Text shown above the buttons
        text: String,
        /// Buttons, passed through as-is
        buttons: Vec<Value>,
    },
    /// Typing indicator or read receipt (not wrapped in `message`)
    Action(SenderAction),
    /// Attachment fetched by the platform from a URL
    UrlAttachment {
        /// Media type
        kind: AttachmentKind,
        /// Public URL of the media
        url: String,
    },
    /// Attachment uploaded from a local file
    FileAttachment {
        /// Media type
        kind: AttachmentKind,
        /// Local path to read
        path: PathBuf,
    },
    /// An already shaped `message` object
    Custom(Value),
}

impl Message {
    /// Build the request body for this message
    ///
    /// # Errors
    ///
    /// Returns [`MessengerError::FileAccess`] if a file attachment cannot be
    /// read.
    pub async fn into_body(self, recipient_id: &str) -> Result<RequestBody, MessengerError> {
        let message = match self {
            Self::Text(text) => text_message(&text),
            Self::Generic { elements } => generic_template(elements),
            Self::Button { text, buttons } => button_template(&text, buttons),
            Self::UrlAttachment { kind, url } => url_attachment(kind, &url),
            Self::Custom(message) => message,
            Self::Action(action) => {
                return Ok(RequestBody::Json(action_envelope(recipient_id, action)));
            },
            Self::FileAttachment { kind, path } => {
                let body = file_attachment(recipient_id, kind, &path).await?;
                return Ok(RequestBody::Multipart(body));
            },
        };

        Ok(RequestBody::Json(message_envelope(recipient_id, message)))
    }

    /// Short name for logging
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Generic { .. } => "generic_template",
            Self::Button { .. } => "button_template",
            Self::Action(_) => "sender_action",
            Self::UrlAttachment { .. } => "url_attachment",
            Self::FileAttachment { .. } => "file_attachment",
            Self::Custom(_) => "custom",
        }
    }
}

/// `{id}` object sent as `recipient`
fn recipient(recipient_id: &str) -> Value {
    json!({ "id": recipient_id })
}

/// `{text}`
#[must_use]
pub fn text_message(text: &str) -> Value {
    json!({ "text": text })
}

/// Generic template attachment
#[must_use]
pub fn generic_template(elements: Vec<Value>) -> Value {
    json!({
        "attachment": {
            "type": "template",
            "payload": {
                "template_type": "generic",
                "elements": elements
            }
        }
    })
}

/// Button template attachment
#[must_use]
pub fn button_template(text: &str, buttons: Vec<Value>) -> Value {
    json!({
        "attachment": {
            "type": "template",
            "payload": {
                "template_type": "button",
                "text": text,
                "buttons": buttons
            }
        }
    })
}

/// Media attachment referenced by URL
#[must_use]
pub fn url_attachment(kind: AttachmentKind, url: &str) -> Value {
    json!({
        "attachment": {
            "type": kind,
            "payload": { "url": url }
        }
    })
}

/// Wrap a message object into `{recipient, message}`
#[must_use]
pub fn message_envelope(recipient_id: &str, message: Value) -> Value {
    json!({
        "recipient": recipient(recipient_id),
        "message": message
    })
}

/// `{recipient, sender_action}`, with no `message` key
#[must_use]
pub fn action_envelope(recipient_id: &str, action: SenderAction) -> Value {
    json!({
        "recipient": recipient(recipient_id),
        "sender_action": action
    })
}

/// Multipart body uploading a local file as an attachment
///
/// The file is read in full before returning, so no handle outlives this
/// call.
///
/// # Errors
///
/// Returns [`MessengerError::FileAccess`] if the path cannot be read.
pub async fn file_attachment(
    recipient_id: &str,
    kind: AttachmentKind,
    path: &Path,
) -> Result<MultipartBody, MessengerError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| MessengerError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

    let file_name = path.file_name().map_or_else(
        || "filedata".to_string(),
        |name| name.to_string_lossy().into_owned(),
    );

    Ok(MultipartBody {
        recipient: recipient(recipient_id),
        message: json!({
            "attachment": {
                "type": kind,
                "payload": {}
            }
        }),
        file: FilePart { file_name, data },
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn text_payload_shape() {
        assert_eq!(text_message("hi"), json!({"text": "hi"}));
    }

    #[test]
    fn generic_template_shape() {
        let payload = generic_template(vec![json!({"title": "x"})]);
        assert_eq!(
            payload,
            json!({
                "attachment": {
                    "type": "template",
                    "payload": {
                        "template_type": "generic",
                        "elements": [{"title": "x"}]
                    }
                }
            })
        );
    }

    #[test]
    fn button_template_shape() {
        let buttons = vec![json!({"type": "postback", "title": "Yes", "payload": "YES"})];
        let payload = button_template("Continue?", buttons.clone());
        assert_eq!(payload["attachment"]["type"], "template");
        assert_eq!(payload["attachment"]["payload"]["template_type"], "button");
        assert_eq!(payload["attachment"]["payload"]["text"], "Continue?");
        assert_eq!(payload["attachment"]["payload"]["buttons"], json!(buttons));
    }

    #[test]
    fn url_attachment_shape() {
        let payload = url_attachment(AttachmentKind::Image, "https://example.com/cat.png");
        assert_eq!(
            payload,
            json!({
                "attachment": {
                    "type": "image",
                    "payload": {"url": "https://example.com/cat.png"}
                }
            })
        );
    }

    #[test]
    fn message_and_action_envelopes_differ() {
        let message = message_envelope("42", text_message("hi"));
        assert_eq!(
            message,
            json!({"recipient": {"id": "42"}, "message": {"text": "hi"}})
        );

        let action = action_envelope("42", SenderAction::TypingOn);
        assert_eq!(
            action,
            json!({"recipient": {"id": "42"}, "sender_action": "typing_on"})
        );
        assert!(action.get("message").is_none());
    }

    #[test]
    fn sender_action_names() {
        assert_eq!("typing_on".parse::<SenderAction>().unwrap(), SenderAction::TypingOn);
        assert_eq!("typing_off".parse::<SenderAction>().unwrap(), SenderAction::TypingOff);
        assert_eq!("mark_seen".parse::<SenderAction>().unwrap(), SenderAction::MarkSeen);
        assert!(matches!(
            "typing".parse::<SenderAction>(),
            Err(MessengerError::InvalidSenderAction(_))
        ));
        assert_eq!(SenderAction::MarkSeen.to_string(), "mark_seen");
    }

    #[test]
    fn attachment_kind_serializes_lowercase() {
        assert_eq!(json!(AttachmentKind::Video), json!("video"));
        assert_eq!(AttachmentKind::File.to_string(), "file");
    }

    #[tokio::test]
    async fn into_body_wraps_message_variants() {
        let body = Message::Text("hi".to_string()).into_body("7").await.unwrap();
        assert_eq!(
            body,
            RequestBody::Json(json!({"recipient": {"id": "7"}, "message": {"text": "hi"}}))
        );

        let body = Message::Custom(json!({"text": "raw", "quick_replies": []}))
            .into_body("7")
            .await
            .unwrap();
        assert_eq!(
            body,
            RequestBody::Json(json!({
                "recipient": {"id": "7"},
                "message": {"text": "raw", "quick_replies": []}
            }))
        );
    }

    #[tokio::test]
    async fn into_body_leaves_action_unwrapped() {
        let body = Message::Action(SenderAction::MarkSeen)
            .into_body("7")
            .await
            .unwrap();
        assert_eq!(
            body,
            RequestBody::Json(json!({"recipient": {"id": "7"}, "sender_action": "mark_seen"}))
        );
    }

    #[tokio::test]
    async fn file_attachment_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG").unwrap();

        let body = file_attachment("42", AttachmentKind::Image, file.path())
            .await
            .unwrap();

        assert_eq!(body.recipient, json!({"id": "42"}));
        assert_eq!(
            body.message,
            json!({"attachment": {"type": "image", "payload": {}}})
        );
        assert_eq!(body.file.data, b"\x89PNG");
        assert!(body.file.file_name.ends_with(".png"));
    }

    #[tokio::test]
    async fn file_attachment_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp3");

        let result = Message::FileAttachment {
            kind: AttachmentKind::Audio,
            path: missing.clone(),
        }
        .into_body("42")
        .await;

        match result {
            Err(MessengerError::FileAccess { path, source }) => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            },
            other => panic!("expected FileAccess, got {other:?}"),
        }
    }
}
