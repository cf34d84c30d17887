use debate_proto::ProtocolError;
use thiserror::Error;

/// Reasons an outbound frame was not sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No open socket.
    #[error("socket is not open")]
    NotConnected,

    /// Frame failed to encode.
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

/// The runtime behind a [`SessionHandle`](crate::SessionHandle) has exited.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("session runtime has stopped")]
pub struct RuntimeStopped;
