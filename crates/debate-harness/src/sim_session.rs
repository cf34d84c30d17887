//! Synchronous session simulation on a manual clock.
//!
//! [`SimSession`] owns a [`SessionClient`] and executes every action it
//! returns in-line: opens are recorded as live sockets, retry timers wait for
//! [`SimSession::advance`], notifications pile up for inspection. No runtime,
//! no channels, no tasks.

use std::time::Duration;

use debate_client::{
    ClientAction, ClientConfig, ClientEvent, CredentialStore, SessionClient, SessionEvent,
    SocketId, TimerId,
};
use debate_proto::{CloseCode, ServerFrame, SessionId};

use crate::{invariants::SessionObservation, sim_env::SimInstant};

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    timer: TimerId,
    due: SimInstant,
}

/// A session client with its actions executed against a scripted network.
pub struct SimSession {
    client: SessionClient<SimInstant>,
    now: SimInstant,
    max_attempts: u32,
    live: Vec<SocketId>,
    opened: Vec<(SocketId, String)>,
    transmitted: Vec<(SocketId, String)>,
    closed_by_client: Vec<(SocketId, CloseCode, String)>,
    timers: Vec<PendingTimer>,
    events: Vec<SessionEvent>,
}

impl SimSession {
    /// Simulate a client for `session` at time zero.
    pub fn new(
        session: SessionId,
        config: &ClientConfig,
        credentials: impl CredentialStore + 'static,
    ) -> Self {
        Self {
            client: SessionClient::new(session, config, credentials),
            now: SimInstant::ZERO,
            max_attempts: config.max_reconnect_attempts,
            live: Vec::new(),
            opened: Vec::new(),
            transmitted: Vec::new(),
            closed_by_client: Vec::new(),
            timers: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Consumer-initiated connect.
    pub fn connect(&mut self) {
        let actions = self.client.connect();
        self.execute(actions);
    }

    /// Consumer-initiated disconnect.
    pub fn disconnect(&mut self) {
        let actions = self.client.disconnect();
        self.execute(actions);
    }

    /// Send a chat message.
    pub fn send_message(&mut self, message: &str) {
        let actions = self.client.send_message(message);
        self.execute(actions);
    }

    /// Start or stop typing.
    pub fn send_typing(&mut self, typing: bool) {
        let actions = self.client.send_typing(typing);
        self.execute(actions);
    }

    /// Server accepts `socket`.
    pub fn accept(&mut self, socket: SocketId) {
        self.inject(ClientEvent::SocketOpened { socket });
    }

    /// Server accepts the most recent socket, if there is one.
    pub fn accept_latest(&mut self) -> Option<SocketId> {
        let socket = self.latest_socket()?;
        self.accept(socket);
        Some(socket)
    }

    /// Server sends raw text on `socket`.
    pub fn deliver(&mut self, socket: SocketId, text: impl Into<String>) {
        self.inject(ClientEvent::FrameReceived { socket, text: text.into() });
    }

    /// Server sends an encoded frame on `socket`.
    pub fn deliver_frame(&mut self, socket: SocketId, frame: &ServerFrame) {
        match frame.encode() {
            Ok(text) => self.deliver(socket, text),
            Err(error) => tracing::warn!(%error, "cannot encode simulated frame"),
        }
    }

    /// Server closes `socket` with `code`.
    pub fn close(&mut self, socket: SocketId, code: CloseCode, reason: &str) {
        self.live.retain(|s| *s != socket);
        self.inject(ClientEvent::SocketClosed { socket, code, reason: reason.to_owned() });
    }

    /// `socket` fails: an error, then an abnormal close.
    pub fn fail(&mut self, socket: SocketId, message: &str) {
        self.live.retain(|s| *s != socket);
        self.inject(ClientEvent::SocketError { socket, message: message.to_owned() });
        self.inject(ClientEvent::SocketClosed {
            socket,
            code: CloseCode::ABNORMAL,
            reason: message.to_owned(),
        });
    }

    /// Feed an arbitrary event to the client at the current time.
    pub fn inject(&mut self, event: ClientEvent) {
        let actions = self.client.handle(event, self.now);
        self.execute(actions);
    }

    /// Move the clock forward, firing every timer that falls due on the way.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        while let Some(index) = self.next_due(target) {
            let PendingTimer { timer, due } = self.timers.remove(index);
            self.now = due;
            self.inject(ClientEvent::ReconnectDue { timer });
        }
        self.now = target;
    }

    fn next_due(&self, target: SimInstant) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| t.due)
            .map(|(index, _)| index)
    }

    fn execute(&mut self, actions: Vec<ClientAction>) {
        for action in actions {
            match action {
                ClientAction::OpenSocket { socket, uri } => {
                    self.live.push(socket);
                    self.opened.push((socket, uri));
                },
                ClientAction::Transmit { socket, text } => {
                    if self.live.contains(&socket) {
                        self.transmitted.push((socket, text));
                    } else {
                        tracing::warn!(%socket, "transmit on dead socket");
                    }
                },
                ClientAction::CloseSocket { socket, code, reason } => {
                    let was_live = self.live.contains(&socket);
                    self.live.retain(|s| *s != socket);
                    self.closed_by_client.push((socket, code, reason.clone()));
                    if was_live {
                        self.inject(ClientEvent::SocketClosed { socket, code, reason });
                    }
                },
                ClientAction::ScheduleReconnect { timer, delay, .. } => {
                    self.timers.push(PendingTimer { timer, due: self.now + delay });
                },
                ClientAction::CancelReconnect { timer } => {
                    self.timers.retain(|t| t.timer != timer);
                },
                ClientAction::Notify(event) => self.events.push(event),
            }
        }
    }

    /// Observation for invariant checks.
    pub fn observe(&self) -> SessionObservation {
        SessionObservation {
            snapshot: self.client.snapshot(),
            live_sockets: self.live.len(),
            pending_timers: self.timers.len(),
            max_attempts: self.max_attempts,
        }
    }

    /// The simulated client.
    pub fn client(&self) -> &SessionClient<SimInstant> {
        &self.client
    }

    /// Current virtual time.
    pub fn now(&self) -> SimInstant {
        self.now
    }

    /// Most recently opened socket.
    pub fn latest_socket(&self) -> Option<SocketId> {
        self.opened.last().map(|(socket, _)| *socket)
    }

    /// Sockets open or opening.
    pub fn live_sockets(&self) -> &[SocketId] {
        &self.live
    }

    /// Every open request with its URI.
    pub fn opened(&self) -> &[(SocketId, String)] {
        &self.opened
    }

    /// Every frame put on the wire.
    pub fn transmitted(&self) -> &[(SocketId, String)] {
        &self.transmitted
    }

    /// Every close the client initiated.
    pub fn closed_by_client(&self) -> &[(SocketId, CloseCode, String)] {
        &self.closed_by_client
    }

    /// Due time of each pending retry, soonest first.
    pub fn pending_timers(&self) -> Vec<SimInstant> {
        let mut due: Vec<_> = self.timers.iter().map(|t| t.due).collect();
        due.sort();
        due
    }

    /// Every notification so far.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Number of notifications matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}
