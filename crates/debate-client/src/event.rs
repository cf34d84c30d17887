//! Client events and actions.

use std::time::Duration;

use debate_core::{SocketId, TimerId};
use debate_proto::{CloseCode, Participant, ServerFrame, TypingUser};

/// Socket and timer outcomes the caller feeds into the client.
///
/// Every event names the socket or timer it belongs to. Events for sockets
/// or timers the client no longer tracks are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Socket finished opening.
    SocketOpened {
        /// Socket that opened.
        socket: SocketId,
    },

    /// Text frame received.
    FrameReceived {
        /// Socket the frame arrived on.
        socket: SocketId,
        /// Raw frame text.
        text: String,
    },

    /// Socket closed.
    SocketClosed {
        /// Socket that closed.
        socket: SocketId,
        /// Close status code.
        code: CloseCode,
        /// Close reason.
        reason: String,
    },

    /// Socket failed. A [`ClientEvent::SocketClosed`] is expected to follow.
    SocketError {
        /// Socket that failed.
        socket: SocketId,
        /// Error description.
        message: String,
    },

    /// Reconnect timer fired.
    ReconnectDue {
        /// Timer that fired.
        timer: TimerId,
    },
}

/// Actions the client asks the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Open a socket. `uri` carries the bearer token.
    OpenSocket {
        /// Id to report this socket's events with.
        socket: SocketId,
        /// Authenticated session URI.
        uri: String,
    },

    /// Send a text frame.
    Transmit {
        /// Destination socket.
        socket: SocketId,
        /// Encoded frame.
        text: String,
    },

    /// Close a socket.
    CloseSocket {
        /// Socket to close.
        socket: SocketId,
        /// Close status code.
        code: CloseCode,
        /// Close reason.
        reason: String,
    },

    /// Start the reconnect timer, replacing any pending one.
    ScheduleReconnect {
        /// Id the timer fires with.
        timer: TimerId,
        /// Wait before the attempt.
        delay: Duration,
        /// Attempt number (1-based).
        attempt: u32,
    },

    /// Stop the reconnect timer.
    CancelReconnect {
        /// Timer to stop.
        timer: TimerId,
    },

    /// Deliver an event to the consumer.
    Notify(SessionEvent),
}

/// Events delivered to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Socket opened.
    Connected,
    /// Socket closed or was closed.
    Disconnected {
        /// Close status code.
        code: CloseCode,
        /// Close reason.
        reason: String,
    },
    /// A decoded inbound frame, unknown tags included.
    Frame(ServerFrame),
    /// The participant roster was replaced.
    ParticipantsUpdated(Vec<Participant>),
    /// The typing set was replaced.
    TypingUpdated(Vec<TypingUser>),
    /// Reconnection gave up.
    ReconnectExhausted {
        /// Attempts that were made.
        attempts: u32,
    },
}
