//! Debate realtime protocol
//!
//! Wire types for the `/ws/debate/<session_id>/` channel. Every frame is a
//! UTF-8 text message carrying one JSON object, discriminated by its `type`
//! field.
//!
//! # Components
//!
//! - [`ServerFrame`]: frames pushed by the server (chat, presence, typing)
//! - [`ClientFrame`]: frames the client sends (chat, typing, reactions)
//! - [`SessionId`]: identifier of one debate session
//! - [`CloseCode`]: WebSocket close status as seen by the reconnect policy
//!
//! The crate never rejects a well-formed frame it does not recognize. Unknown
//! tags decode to [`ServerFrame::Other`] so consumers still see them.

#![forbid(unsafe_code)]

pub mod close;
pub mod errors;
pub mod frame;
pub mod payloads;
pub mod session;

pub use close::CloseCode;
pub use errors::{ProtocolError, Result};
pub use frame::{ClientFrame, ServerFrame};
pub use payloads::{
    chat::{ChatMessage, Reaction},
    presence::{MembershipChange, Participant, TypingStatus, TypingUser},
    session::ConnectionEstablished,
};
pub use session::SessionId;
