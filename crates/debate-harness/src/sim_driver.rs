//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` stands in for the WebSocket transport so the same
//! [`debate_client::Runtime`] orchestration code runs in both production and
//! simulation. Tests script the far side of every socket through the
//! [`SimNetwork`] handle: accept or refuse opens, deliver frames, drop
//! connections with any close code.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use debate_client::{ClientEvent, Driver, SocketId};
use debate_proto::{CloseCode, ServerFrame};
use tokio::sync::mpsc;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// How the simulated server answers an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum OpenPolicy {
    /// Report the socket open right away.
    #[default]
    Accept,
    /// Leave the socket connecting until the test opens it.
    Hold,
    /// Fail the open call itself.
    Refuse,
}

#[derive(Debug, Default)]
struct NetworkState {
    policy: OpenPolicy,
    opened: Vec<(SocketId, String)>,
    transmitted: Vec<(SocketId, String)>,
    closed_by_client: Vec<(SocketId, CloseCode, String)>,
    live: BTreeSet<SocketId>,
}

/// Test-side handle to the simulated network.
///
/// Cloneable; every clone controls the same [`SimDriver`].
#[derive(Debug, Clone)]
pub struct SimNetwork {
    state: Arc<Mutex<NetworkState>>,
    events: mpsc::UnboundedSender<ClientEvent>,
}

impl SimNetwork {
    fn state(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ClientEvent) {
        // The driver owns the receiver; once it is gone nobody is listening
        let _ = self.events.send(event);
    }

    /// Open requests complete immediately (the default).
    pub fn accept_opens(&self) {
        self.state().policy = OpenPolicy::Accept;
    }

    /// Open requests stay pending until [`SimNetwork::complete_open`].
    pub fn hold_opens(&self) {
        self.state().policy = OpenPolicy::Hold;
    }

    /// Open requests fail outright.
    pub fn refuse_opens(&self) {
        self.state().policy = OpenPolicy::Refuse;
    }

    /// Report a held socket as open.
    pub fn complete_open(&self, socket: SocketId) {
        self.emit(ClientEvent::SocketOpened { socket });
    }

    /// Deliver raw text on a socket.
    pub fn deliver(&self, socket: SocketId, text: impl Into<String>) {
        self.emit(ClientEvent::FrameReceived { socket, text: text.into() });
    }

    /// Deliver an encoded server frame on a socket.
    pub fn deliver_frame(&self, socket: SocketId, frame: &ServerFrame) {
        match frame.encode() {
            Ok(text) => self.deliver(socket, text),
            Err(error) => tracing::warn!(%error, "cannot encode simulated frame"),
        }
    }

    /// Server closes a socket with `code`.
    pub fn close(&self, socket: SocketId, code: CloseCode, reason: &str) {
        self.state().live.remove(&socket);
        self.emit(ClientEvent::SocketClosed { socket, code, reason: reason.to_owned() });
    }

    /// Socket fails: an error followed by an abnormal close.
    pub fn fail(&self, socket: SocketId, message: &str) {
        self.state().live.remove(&socket);
        self.emit(ClientEvent::SocketError { socket, message: message.to_owned() });
        self.emit(ClientEvent::SocketClosed {
            socket,
            code: CloseCode::ABNORMAL,
            reason: message.to_owned(),
        });
    }

    /// Most recently requested socket.
    pub fn latest_socket(&self) -> Option<SocketId> {
        self.state().opened.last().map(|(socket, _)| *socket)
    }

    /// Every open request so far, with its URI.
    pub fn opened(&self) -> Vec<(SocketId, String)> {
        self.state().opened.clone()
    }

    /// Number of open requests so far.
    pub fn open_count(&self) -> usize {
        self.state().opened.len()
    }

    /// Every frame the client sent.
    pub fn transmitted(&self) -> Vec<(SocketId, String)> {
        self.state().transmitted.clone()
    }

    /// Every close the client initiated.
    pub fn closed_by_client(&self) -> Vec<(SocketId, CloseCode, String)> {
        self.state().closed_by_client.clone()
    }

    /// Sockets opened and not yet closed by either side.
    pub fn live_sockets(&self) -> Vec<SocketId> {
        self.state().live.iter().copied().collect()
    }
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the production [`debate_client::Runtime`] runs
/// unchanged against scripted sockets.
pub struct SimDriver {
    network: SimNetwork,
    events: mpsc::UnboundedReceiver<ClientEvent>,
}

impl SimDriver {
    /// Create a driver and the handle that scripts it.
    #[must_use]
    pub fn new() -> (Self, SimNetwork) {
        let (tx, events) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(NetworkState::default()));
        let network = SimNetwork { state, events: tx };
        (Self { network: network.clone(), events }, network)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn open(&mut self, socket: SocketId, uri: &str) -> Result<(), Self::Error> {
        let policy = {
            let mut state = self.network.state();
            state.opened.push((socket, uri.to_owned()));
            if state.policy != OpenPolicy::Refuse {
                state.live.insert(socket);
            }
            state.policy
        };
        match policy {
            OpenPolicy::Accept => {
                self.network.complete_open(socket);
                Ok(())
            },
            OpenPolicy::Hold => Ok(()),
            OpenPolicy::Refuse => Err(SimDriverError(format!("connection refused for {socket}"))),
        }
    }

    async fn transmit(&mut self, socket: SocketId, text: String) -> Result<(), Self::Error> {
        let mut state = self.network.state();
        if !state.live.contains(&socket) {
            return Err(SimDriverError(format!("{socket} is not live")));
        }
        state.transmitted.push((socket, text));
        Ok(())
    }

    async fn close(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: &str,
    ) -> Result<(), Self::Error> {
        let was_live = {
            let mut state = self.network.state();
            state.closed_by_client.push((socket, code, reason.to_owned()));
            state.live.remove(&socket)
        };
        if was_live {
            let reason = reason.to_owned();
            self.network.emit(ClientEvent::SocketClosed { socket, code, reason });
        }
        Ok(())
    }

    async fn next_event(&mut self) -> ClientEvent {
        match self.events.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "ws://localhost:8001/ws/debate/1/?token=t";

    #[tokio::test]
    async fn accepted_open_reports_opened() {
        let (mut driver, network) = SimDriver::new();
        let socket = SocketId::from_raw(1);

        driver.open(socket, URI).await.unwrap();

        assert_eq!(driver.next_event().await, ClientEvent::SocketOpened { socket });
        assert_eq!(network.live_sockets(), vec![socket]);
        assert_eq!(network.latest_socket(), Some(socket));
    }

    #[tokio::test]
    async fn refused_open_is_an_error() {
        let (mut driver, network) = SimDriver::new();
        network.refuse_opens();

        assert!(driver.open(SocketId::from_raw(1), URI).await.is_err());
        assert!(network.live_sockets().is_empty());
        assert_eq!(network.open_count(), 1);
    }

    #[tokio::test]
    async fn transmit_to_dead_socket_fails() {
        let (mut driver, network) = SimDriver::new();
        let socket = SocketId::from_raw(1);
        driver.open(socket, URI).await.unwrap();

        network.close(socket, CloseCode::ABNORMAL, "");

        assert!(driver.transmit(socket, "x".into()).await.is_err());
        assert!(network.transmitted().is_empty());
    }

    #[tokio::test]
    async fn client_close_is_echoed_once() {
        let (mut driver, network) = SimDriver::new();
        let socket = SocketId::from_raw(1);
        driver.open(socket, URI).await.unwrap();
        let _opened = driver.next_event().await;

        driver.close(socket, CloseCode::NORMAL, "bye").await.unwrap();
        driver.close(socket, CloseCode::NORMAL, "bye").await.unwrap();

        assert_eq!(
            driver.next_event().await,
            ClientEvent::SocketClosed { socket, code: CloseCode::NORMAL, reason: "bye".into() }
        );
        assert_eq!(network.closed_by_client().len(), 2);
    }
}
