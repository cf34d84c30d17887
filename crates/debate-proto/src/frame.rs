//! Inbound and outbound frames.
//!
//! Inbound decoding has two hard failures: text that is not JSON and JSON
//! that is not an object.
//! Everything else, including a known tag whose body has the wrong shape,
//! becomes [`ServerFrame::Other`].

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    errors::{ProtocolError, Result},
    payloads::{
        chat::{ChatMessage, Reaction},
        presence::{MembershipChange, TypingStatus},
        session::ConnectionEstablished,
    },
    session::SessionId,
};

/// Name of the discriminator field carried by every frame.
pub const TYPE_FIELD: &str = "type";

/// A frame pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// `message`: a chat message broadcast.
    Message(ChatMessage),
    /// `user_joined`: someone entered the session.
    UserJoined(MembershipChange),
    /// `user_left`: someone left the session.
    UserLeft(MembershipChange),
    /// `typing_status`: the current typing set.
    TypingStatus(TypingStatus),
    /// `message_reaction`: a reaction echo.
    MessageReaction(Reaction),
    /// `connection_established`: greeting after accept.
    ConnectionEstablished(ConnectionEstablished),
    /// Any frame the client has no typed shape for.
    Other {
        /// Value of the `type` field, empty if absent or not a string.
        kind: String,
        /// The whole JSON object as received.
        body: Value,
    },
}

impl ServerFrame {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Malformed` if `text` is not valid JSON
    /// - `ProtocolError::NotAnObject` if the JSON value is not an object
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ProtocolError::Malformed { reason: e.to_string() })?;

        let Value::Object(ref object) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let kind = object.get(TYPE_FIELD).and_then(Value::as_str).unwrap_or_default().to_owned();

        let typed = match kind.as_str() {
            "message" => typed(&value).map(Self::Message),
            "user_joined" => typed(&value).map(Self::UserJoined),
            "user_left" => typed(&value).map(Self::UserLeft),
            "typing_status" => typed(&value).map(Self::TypingStatus),
            "message_reaction" => typed(&value).map(Self::MessageReaction),
            "connection_established" => typed(&value).map(Self::ConnectionEstablished),
            _ => None,
        };

        Ok(typed.unwrap_or(Self::Other { kind, body: value }))
    }

    /// The frame's `type` tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::UserJoined(_) => "user_joined",
            Self::UserLeft(_) => "user_left",
            Self::TypingStatus(_) => "typing_status",
            Self::MessageReaction(_) => "message_reaction",
            Self::ConnectionEstablished(_) => "connection_established",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Encode back to JSON text, `type` field included.
    ///
    /// Used by simulated servers and tests.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if a payload fails to serialize
    pub fn encode(&self) -> Result<String> {
        let value = match self {
            Self::Message(p) => tagged(self.kind(), p)?,
            Self::UserJoined(p) | Self::UserLeft(p) => tagged(self.kind(), p)?,
            Self::TypingStatus(p) => tagged(self.kind(), p)?,
            Self::MessageReaction(p) => tagged(self.kind(), p)?,
            Self::ConnectionEstablished(p) => tagged(self.kind(), p)?,
            Self::Other { body, .. } => body.clone(),
        };
        serde_json::to_string(&value).map_err(|e| ProtocolError::Encode { reason: e.to_string() })
    }
}

fn typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

fn tagged<T: Serialize>(kind: &str, payload: &T) -> Result<Value> {
    let value = serde_json::to_value(payload)
        .map_err(|e| ProtocolError::Encode { reason: e.to_string() })?;
    let mut object = match value {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    object.insert(TYPE_FIELD.to_owned(), Value::String(kind.to_owned()));
    Ok(Value::Object(object))
}

/// A frame sent by the client.
///
/// Every variant carries the session id it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Post a chat message.
    Message {
        /// Message text.
        message: String,
        /// Target session.
        session_id: SessionId,
    },
    /// Post a chat message with an attached image.
    MessageWithImage {
        /// Message text.
        message: String,
        /// Uploaded image location.
        image_url: String,
        /// Target session.
        session_id: SessionId,
    },
    /// The local user started typing.
    TypingStart {
        /// Target session.
        session_id: SessionId,
    },
    /// The local user stopped typing.
    TypingStop {
        /// Target session.
        session_id: SessionId,
    },
    /// React to a message.
    MessageReaction {
        /// Message being reacted to.
        message_id: u64,
        /// Reaction emoji.
        emoji: String,
        /// Target session.
        session_id: SessionId,
    },
    /// Announce presence in the session.
    JoinDebate {
        /// Target session.
        session_id: SessionId,
    },
}

impl ClientFrame {
    /// Typing start or stop, depending on `typing`.
    #[must_use]
    pub const fn typing(typing: bool, session_id: SessionId) -> Self {
        if typing { Self::TypingStart { session_id } } else { Self::TypingStop { session_id } }
    }

    /// Session this frame targets.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        match self {
            Self::Message { session_id, .. }
            | Self::MessageWithImage { session_id, .. }
            | Self::TypingStart { session_id }
            | Self::TypingStop { session_id }
            | Self::MessageReaction { session_id, .. }
            | Self::JoinDebate { session_id } => *session_id,
        }
    }

    /// Encode to JSON text.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode { reason: e.to_string() })
    }
}
