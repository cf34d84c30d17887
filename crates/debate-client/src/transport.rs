//! WebSocket transport for the session runtime.
//!
//! Provides [`WsDriver`], a [`Driver`] that runs each socket on its own task
//! over `tokio-tungstenite`. Socket tasks report back through one shared
//! channel, so protocol logic stays in the Sans-IO [`crate::SessionClient`].

use std::{collections::HashMap, time::Duration};

use debate_core::SocketId;
use debate_proto::CloseCode;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode as WsCloseCode},
    },
};

use crate::{driver::Driver, event::ClientEvent};

/// Capacity of the shared event channel.
const EVENT_CAPACITY: usize = 256;

/// How long a closing socket waits for the peer's close frame.
const CLOSE_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// How long [`WsDriver`] waits for socket tasks on shutdown before aborting.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No task exists for this socket.
    #[error("unknown socket {0}")]
    UnknownSocket(SocketId),

    /// The socket's task has exited.
    #[error("socket {0} has already closed")]
    SocketGone(SocketId),
}

enum Outbound {
    Text(String),
    Close { code: CloseCode, reason: String },
}

struct SocketTask {
    outbound: mpsc::UnboundedSender<Outbound>,
    handle: JoinHandle<()>,
}

/// WebSocket [`Driver`].
///
/// Call [`Driver::shutdown`] to let queued closes reach the wire. Dropping
/// the driver aborts every socket task that is still running.
pub struct WsDriver {
    sockets: HashMap<SocketId, SocketTask>,
    events_tx: mpsc::Sender<ClientEvent>,
    events_rx: mpsc::Receiver<ClientEvent>,
}

impl WsDriver {
    /// Create a driver with no sockets.
    ///
    /// Installs the `ring` TLS provider for `wss://` endpoints unless another
    /// provider is already installed.
    #[must_use]
    pub fn new() -> Self {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        Self { sockets: HashMap::new(), events_tx, events_rx }
    }

    fn prune(&mut self) {
        self.sockets.retain(|_, task| !task.handle.is_finished());
    }

    fn outbound(
        &self,
        socket: SocketId,
    ) -> Result<&mpsc::UnboundedSender<Outbound>, TransportError> {
        self.sockets
            .get(&socket)
            .map(|task| &task.outbound)
            .ok_or(TransportError::UnknownSocket(socket))
    }
}

impl Default for WsDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WsDriver {
    fn drop(&mut self) {
        for task in self.sockets.values() {
            task.handle.abort();
        }
    }
}

impl Driver for WsDriver {
    type Error = TransportError;

    async fn open(&mut self, socket: SocketId, uri: &str) -> Result<(), Self::Error> {
        self.prune();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let events = self.events_tx.clone();
        let handle = tokio::spawn(run_socket(socket, uri.to_owned(), outbound_rx, events));
        self.sockets.insert(socket, SocketTask { outbound, handle });
        Ok(())
    }

    async fn transmit(&mut self, socket: SocketId, text: String) -> Result<(), Self::Error> {
        self.outbound(socket)?
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::SocketGone(socket))
    }

    async fn close(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: &str,
    ) -> Result<(), Self::Error> {
        let result = self
            .outbound(socket)?
            .send(Outbound::Close { code, reason: reason.to_owned() })
            .map_err(|_| TransportError::SocketGone(socket));
        self.prune();
        result
    }

    async fn next_event(&mut self) -> ClientEvent {
        match self.events_rx.recv().await {
            Some(event) => event,
            // Only closed by shutdown
            None => std::future::pending().await,
        }
    }

    async fn shutdown(&mut self) {
        // Nobody reads events past this point, so socket tasks must never block on them
        self.events_rx.close();

        // Dropping each sender lets its task finish once the queue drains
        let handles: Vec<_> = self.sockets.drain().map(|(_, task)| task.handle).collect();
        if handles.is_empty() {
            return;
        }
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

        if timeout(SHUTDOWN_TIMEOUT, futures::future::join_all(handles)).await.is_err() {
            tracing::warn!(sockets = aborts.len(), "socket tasks did not finish closing in time");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}

/// Run one socket: connect, then bridge frames between the channel and the
/// stream until either side closes.
///
/// A close queued while the handshake is still running abandons it, which
/// drops the half-open connection.
async fn run_socket(
    socket: SocketId,
    uri: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::Sender<ClientEvent>,
) {
    let connecting = connect_async(uri.as_str());
    tokio::pin!(connecting);

    let stream = loop {
        tokio::select! {
            result = &mut connecting => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    report_failure(&events, socket, e.to_string()).await;
                    return;
                },
            },
            out = outbound.recv() => match out {
                Some(Outbound::Text(_)) => {
                    tracing::warn!(%socket, "dropping frame queued before open");
                },
                Some(Outbound::Close { code, reason }) => {
                    tracing::debug!(%socket, "closed while opening");
                    let _ = events.send(ClientEvent::SocketClosed { socket, code, reason }).await;
                    return;
                },
                None => return,
            },
        }
    };
    let _ = events.send(ClientEvent::SocketOpened { socket }).await;

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            out = outbound.recv() => match out {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        report_failure(&events, socket, e.to_string()).await;
                        return;
                    }
                },
                Some(Outbound::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: WsCloseCode::from(code.get()),
                        reason: reason.clone().into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        tracing::debug!(%socket, error = %e, "close frame not sent");
                    }
                    let _ = events.send(ClientEvent::SocketClosed { socket, code, reason }).await;

                    // Read until the peer answers so the closing handshake completes
                    let acked = timeout(CLOSE_ACK_TIMEOUT, async {
                        while let Some(Ok(_)) = source.next().await {}
                    });
                    if acked.await.is_err() {
                        tracing::debug!(%socket, "peer did not answer close");
                    }
                    return;
                },
                None => {
                    let _ = sink.close().await;
                    return;
                },
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ClientEvent::FrameReceived { socket, text }).await;
                },
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame.map_or((CloseCode::NO_STATUS, String::new()), |f| {
                        (CloseCode::new(u16::from(f.code)), f.reason.into_owned())
                    });
                    let _ = events.send(ClientEvent::SocketClosed { socket, code, reason }).await;
                    return;
                },
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(%socket, "ignoring binary frame");
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    report_failure(&events, socket, e.to_string()).await;
                    return;
                },
                None => {
                    let _ = events
                        .send(ClientEvent::SocketClosed {
                            socket,
                            code: CloseCode::ABNORMAL,
                            reason: "stream ended".to_owned(),
                        })
                        .await;
                    return;
                },
            },
        }
    }
}

async fn report_failure(events: &mpsc::Sender<ClientEvent>, socket: SocketId, message: String) {
    let _ = events.send(ClientEvent::SocketError { socket, message: message.clone() }).await;
    let _ = events
        .send(ClientEvent::SocketClosed { socket, code: CloseCode::ABNORMAL, reason: message })
        .await;
}
