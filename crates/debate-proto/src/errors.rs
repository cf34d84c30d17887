//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding or encoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame text is not valid JSON.
    #[error("malformed frame: {reason}")]
    Malformed {
        /// Parser error message.
        reason: String,
    },

    /// Frame is valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Frame could not be serialized.
    #[error("failed to encode frame: {reason}")]
    Encode {
        /// Serializer error message.
        reason: String,
    },

    /// Session identifiers are positive.
    #[error("invalid session id: {0}")]
    InvalidSessionId(u64),
}
