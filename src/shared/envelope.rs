/**
 * Envelope Types
 *
 * This module defines the logical message units exchanged over a realtime
 * connection: inbound `Envelope`s sent by clients and outbound
 * `ServerFrame`s sent by the server.
 *
 * # Message Types
 *
 * Every inbound envelope declares a type:
 * - `CHAT` - Free-text message broadcast to every other connection
 * - `NOTIFICATION` - Targeted message for one or more identities
 * - anything else - Kept as `MessageType::Other` so the router can reject it
 *   (or a later handler can claim it) without the codec knowing about it
 *
 * Envelopes are transient: built from raw bytes on receipt, consumed by the
 * router, never persisted.
 */
use crate::shared::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declared type of an inbound envelope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Chat message for every other connection
    Chat,
    /// Targeted notification
    Notification,
    /// Any type the core does not know about
    Other(String),
}

impl MessageType {
    pub const CHAT: &'static str = "CHAT";
    pub const NOTIFICATION: &'static str = "NOTIFICATION";

    /// Wire name of this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Chat => Self::CHAT,
            Self::Notification => Self::NOTIFICATION,
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for MessageType {
    fn from(name: &str) -> Self {
        match name {
            Self::CHAT => Self::Chat,
            Self::NOTIFICATION => Self::Notification,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `CHAT` envelope
///
/// Only the text is read from the client. A `user` field in the payload is
/// ignored: the sender is always the identity bound to the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub text: String,
}

/// Recipients of a notification, either one name or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    /// Iterate recipient names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names.as_slice(),
        };
        names.iter().map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        self.names().all(|name| name.trim().is_empty())
    }
}

/// Body of a `NOTIFICATION` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Display names or user ids of the recipients
    pub to: Recipients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Arbitrary structured data forwarded untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Type-specific envelope body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Chat(ChatPayload),
    Notification(NotificationPayload),
    /// Fields of an envelope whose type the core does not interpret
    Opaque(Map<String, Value>),
}

/// One decoded inbound message
///
/// The declared type and the payload shape always agree: a `Chat` envelope
/// carries a `ChatPayload`, and so on. Construction goes through the
/// associated functions below to keep it that way.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    kind: MessageType,
    payload: Payload,
}

impl Envelope {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            kind: MessageType::Chat,
            payload: Payload::Chat(ChatPayload { text: text.into() }),
        }
    }

    /// `Some(Value::Null)` data is stored as `None`; the wire form has no
    /// way to tell them apart
    pub fn notification(to: Recipients, text: Option<String>, data: Option<Value>) -> Self {
        Self {
            kind: MessageType::Notification,
            payload: Payload::Notification(NotificationPayload {
                to,
                text,
                data: present(data),
            }),
        }
    }

    /// Build an envelope of any type from its fields
    ///
    /// Known types are validated exactly as if they had arrived on the wire.
    pub fn custom(kind: &str, mut fields: Map<String, Value>) -> Result<Self, DecodeError> {
        fields.remove("type");
        Self::from_parts(MessageType::from(kind), fields)
    }

    pub fn kind(&self) -> &MessageType {
        &self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Parse a JSON value into an envelope
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(DecodeError::malformed(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => MessageType::from(kind.as_str()),
            _ => return Err(DecodeError::MissingType),
        };

        Self::from_parts(kind, fields)
    }

    /// Render the envelope as its wire JSON value
    pub fn to_value(&self) -> Value {
        let mut fields = match &self.payload {
            Payload::Chat(chat) => object_of(chat),
            Payload::Notification(notification) => object_of(notification),
            Payload::Opaque(fields) => fields.clone(),
        };
        fields.insert("type".to_string(), Value::String(self.kind.as_str().to_string()));
        Value::Object(fields)
    }

    fn from_parts(kind: MessageType, fields: Map<String, Value>) -> Result<Self, DecodeError> {
        let payload = match &kind {
            MessageType::Chat => {
                let chat: ChatPayload = parse_payload(&kind, fields)?;
                Payload::Chat(chat)
            }
            MessageType::Notification => {
                let mut notification: NotificationPayload = parse_payload(&kind, fields)?;
                notification.data = present(notification.data.take());
                if notification.to.is_empty() {
                    return Err(DecodeError::invalid_field(
                        kind.as_str(),
                        "to",
                        "at least one recipient is required",
                    ));
                }
                Payload::Notification(notification)
            }
            MessageType::Other(_) => Payload::Opaque(fields),
        };

        Ok(Self { kind, payload })
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    kind: &MessageType,
    fields: Map<String, Value>,
) -> Result<T, DecodeError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| {
        let detail = e.to_string();
        // only "missing field `name`" names the field; type mismatches do not
        let field = detail
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split('`').next())
            .unwrap_or("payload")
            .to_string();
        DecodeError::invalid_field(kind.as_str(), field, detail)
    })
}

/// Null data counts as absent
fn present(data: Option<Value>) -> Option<Value> {
    data.filter(|value| !value.is_null())
}

fn object_of<T: Serialize>(payload: &T) -> Map<String, Value> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Body of a delivered notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationBody {
    /// Display name of the sending connection's identity
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl NotificationBody {
    pub fn new(from: impl Into<String>, text: Option<String>, data: Option<Value>) -> Self {
        Self {
            from: from.into(),
            text,
            data: present(data),
        }
    }
}

/// Server-to-client frame
///
/// ```json
/// {"user": "alice", "text": "hi"}
/// {"notification": {"from": "alice", "text": "poke"}}
/// {"error": "Unknown message type"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Chat { user: String, text: String },
    Notification { notification: NotificationBody },
    Error { error: String },
}

impl ServerFrame {
    pub fn chat(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Chat {
            user: user.into(),
            text: text.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            error: reason.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
