//! Driver trait for abstracting socket I/O.
//!
//! The [`Driver`] trait decouples the session runtime from a specific socket
//! implementation. The WebSocket transport and the simulation harness both
//! implement it, while the generic [`crate::Runtime`] handles orchestration.

use std::future::Future;

use debate_core::SocketId;
use debate_proto::CloseCode;

use crate::event::ClientEvent;

/// Abstracts socket I/O for the session runtime.
///
/// Drivers report socket outcomes through [`Driver::next_event`], tagged with
/// the [`SocketId`] the runtime assigned at [`Driver::open`]. After a socket
/// fails, a driver reports [`ClientEvent::SocketError`] followed by
/// [`ClientEvent::SocketClosed`].
///
/// # Implementations
///
/// - **WebSocket**: `transport::WsDriver`, one task per socket
/// - **Simulation**: scripted sockets with a virtual clock
pub trait Driver: Send {
    /// Driver-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Start opening a socket to `uri`.
    ///
    /// Completion is reported later as [`ClientEvent::SocketOpened`] or as an
    /// error and close.
    ///
    /// # Errors
    ///
    /// Returns an error if the open could not even be started. The runtime
    /// treats this as an error followed by an abnormal close.
    fn open(
        &mut self,
        socket: SocketId,
        uri: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a text frame on an open socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is unknown or gone.
    fn transmit(
        &mut self,
        socket: SocketId,
        text: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close a socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is unknown or gone.
    fn close(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Wait for the next socket event.
    ///
    /// Must be cancel-safe: the runtime polls it inside `select!`. Pends
    /// forever when no socket can produce events.
    fn next_event(&mut self) -> impl Future<Output = ClientEvent> + Send;

    /// Finish in-flight work before the runtime exits.
    ///
    /// Called once, after the final disconnect has been executed. Closes
    /// already handed to [`Driver::close`] must reach the peer before this
    /// resolves, within a driver-chosen bound. The driver is not used again.
    fn shutdown(&mut self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
