//! Session connection state machine.
//!
//! Owns the lifecycle of the single socket a client holds for one debate
//! session, and the bounded reconnect timer. Uses the action pattern: methods
//! return [`ConnectionAction`]s for the driver to execute, and socket outcomes
//! come back as method calls tagged with the [`SocketId`] they belong to.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐ opened ┌──────┐
//! │ Idle │────────>│ Connecting │───────>│ Open │
//! └──────┘         └────────────┘        └──────┘
//!                    ↑    │ error           │ error
//!                    │    ↓                 ↓
//!                    │  ┌─────────┐   ┌─────────┐
//!              timer │  │ Closing │   │ Closing │
//!                    │  └─────────┘   └─────────┘
//!                    │        │ closed      │ closed
//!                    │        ↓             ↓
//!   ┌────────────────────┐  ≠1000   ┌──────────────────────┐
//!   │ ReconnectScheduled │<─────────│ closed (any socket)  │
//!   └────────────────────┘          └──────────────────────┘
//!                                     │ 1000, disconnect, or
//!                                     │ retry budget spent
//!                                     ↓
//!                                ┌──────────┐
//!                                │ Terminal │
//!                                └──────────┘
//! ```
//!
//! # Stale events
//!
//! Every socket gets a fresh id. Events for any socket other than the current
//! one are ignored, as are timer firings for a timer that was cancelled or
//! replaced. A late close from an abandoned socket can never clear a newer
//! handle or schedule a second retry.

use std::{fmt, time::Duration};

use debate_proto::{CloseCode, SessionId};

use crate::{
    config::{ClientConfig, Endpoint},
    credentials::CredentialStore,
    error::ConnectError,
    reconnect::{ReconnectPolicy, ReconnectState},
};

/// Reason sent with the close frame of an intentional disconnect.
pub const INTENTIONAL_DISCONNECT_REASON: &str = "Intentional disconnect";

/// Client-assigned socket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    /// Rebuild an id from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

/// Client-assigned reconnect timer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Rebuild an id from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a socket to `uri`. The URI contains the bearer token and must not
    /// be logged.
    OpenSocket {
        /// Id to tag this socket's events with.
        socket: SocketId,
        /// Authenticated session URI.
        uri: String,
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

    /// Start a timer that reports back after `delay`. Replaces any pending
    /// timer.
    ScheduleReconnect {
        /// Id the timer reports back with.
        timer: TimerId,
        /// Wait before the attempt.
        delay: Duration,
        /// Which attempt this is (1-based).
        attempt: u32,
    },

    /// Stop a pending timer.
    CancelReconnect {
        /// Timer to stop.
        timer: TimerId,
    },

    /// The socket opened.
    Connected,

    /// The socket is gone.
    Disconnected {
        /// Close status code.
        code: CloseCode,
        /// Close reason.
        reason: String,
    },

    /// Every reconnect attempt was used without a successful open.
    ReconnectExhausted {
        /// Attempts that were made.
        attempts: u32,
    },
}

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected.
    Idle,
    /// Socket opening.
    Connecting,
    /// Socket open.
    Open,
    /// Socket failed, close not yet reported.
    Closing,
    /// No socket, retry timer pending.
    ReconnectScheduled,
    /// No socket and no retry pending.
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Connecting,
    Open,
    Errored,
}

#[derive(Debug, Clone, Copy)]
struct Socket {
    id: SocketId,
    readiness: Readiness,
}

/// Connection state machine for one session.
///
/// Pure: no I/O and no clock. At most one socket is tracked at a time.
#[derive(Debug, Clone)]
pub struct Connection {
    session: SessionId,
    endpoint: Endpoint,
    reconnect: ReconnectState,
    socket: Option<Socket>,
    /// Attempt in progress; set on open request, cleared on open, close or
    /// error.
    in_flight: bool,
    connected: bool,
    timer: Option<TimerId>,
    next_socket: u64,
    next_timer: u64,
    /// Exhaustion is reported once per exhausted run.
    exhaustion_reported: bool,
}

impl Connection {
    /// Create a connection for `session`. Nothing is opened.
    #[must_use]
    pub fn new(session: SessionId, config: &ClientConfig) -> Self {
        Self {
            session,
            endpoint: config.endpoint.clone(),
            reconnect: ReconnectState::new(ReconnectPolicy::from_config(config)),
            socket: None,
            in_flight: false,
            connected: false,
            timer: None,
            next_socket: 0,
            next_timer: 0,
            exhaustion_reported: false,
        }
    }

    /// Session this connection is bound to.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match self.socket.map(|s| s.readiness) {
            Some(Readiness::Connecting) => ConnectionState::Connecting,
            Some(Readiness::Open) => ConnectionState::Open,
            Some(Readiness::Errored) => ConnectionState::Closing,
            None if self.timer.is_some() => ConnectionState::ReconnectScheduled,
            None if self.next_socket == 0 => ConnectionState::Idle,
            None => ConnectionState::Terminal,
        }
    }

    /// Whether the socket is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether an open request is pending.
    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.in_flight
    }

    /// Current socket, open or not.
    #[must_use]
    pub fn socket(&self) -> Option<SocketId> {
        self.socket.map(|s| s.id)
    }

    /// Socket to transmit on, if it is open.
    #[must_use]
    pub fn open_socket(&self) -> Option<SocketId> {
        self.socket.filter(|s| s.readiness == Readiness::Open).map(|s| s.id)
    }

    /// Pending reconnect timer.
    #[must_use]
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Reconnect attempts since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.reconnect.attempts()
    }

    /// Reconnect policy in effect.
    #[must_use]
    pub fn policy(&self) -> &ReconnectPolicy {
        self.reconnect.policy()
    }

    /// Log-safe URI of this session.
    #[must_use]
    pub fn redacted_uri(&self) -> String {
        self.endpoint.redacted_uri(self.session)
    }

    /// Request a socket.
    ///
    /// Reads the token from `credentials` only once the checks against the
    /// current socket pass. A pending retry timer is cancelled.
    ///
    /// # Errors
    ///
    /// - `ConnectError::AlreadyActive` if a socket is open
    /// - `ConnectError::InFlight` if a socket is opening
    /// - `ConnectError::SocketClosing` if a failed socket has not closed yet
    /// - `ConnectError::MissingCredential` if there is no token
    ///
    /// Nothing changes when an error is returned.
    pub fn connect(
        &mut self,
        credentials: &dyn CredentialStore,
    ) -> Result<Vec<ConnectionAction>, ConnectError> {
        match self.socket.map(|s| s.readiness) {
            Some(Readiness::Open) => return Err(ConnectError::AlreadyActive),
            Some(Readiness::Connecting) => return Err(ConnectError::InFlight),
            Some(Readiness::Errored) => return Err(ConnectError::SocketClosing),
            None => {},
        }
        if self.in_flight {
            return Err(ConnectError::InFlight);
        }
        let token = credentials.bearer_token().ok_or(ConnectError::MissingCredential)?;

        let mut actions = Vec::with_capacity(2);
        if let Some(timer) = self.timer.take() {
            actions.push(ConnectionAction::CancelReconnect { timer });
        }

        self.next_socket += 1;
        let socket = SocketId(self.next_socket);
        self.socket = Some(Socket { id: socket, readiness: Readiness::Connecting });
        self.in_flight = true;
        self.exhaustion_reported = false;

        actions.push(ConnectionAction::OpenSocket {
            socket,
            uri: self.endpoint.session_uri(self.session, &token),
        });
        Ok(actions)
    }

    /// The reconnect timer fired.
    ///
    /// A firing for a timer that is no longer pending returns no actions.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::connect`]. The attempt is spent either way and no
    /// further retry is scheduled from a failed connect.
    pub fn reconnect_due(
        &mut self,
        timer: TimerId,
        credentials: &dyn CredentialStore,
    ) -> Result<Vec<ConnectionAction>, ConnectError> {
        if self.timer != Some(timer) {
            tracing::debug!(%timer, "ignoring stale reconnect timer");
            return Ok(Vec::new());
        }
        self.timer = None;
        self.connect(credentials)
    }

    /// Socket finished opening.
    pub fn on_opened(&mut self, socket: SocketId) -> Vec<ConnectionAction> {
        let Some(current) = self.current_mut(socket) else {
            return Vec::new();
        };
        if current.readiness != Readiness::Connecting {
            tracing::debug!(%socket, "ignoring duplicate open");
            return Vec::new();
        }
        current.readiness = Readiness::Open;
        self.in_flight = false;
        self.connected = true;
        self.reconnect.reset();
        self.exhaustion_reported = false;
        vec![ConnectionAction::Connected]
    }

    /// Socket reported an error. No retry is scheduled from an error; the
    /// close that follows decides.
    pub fn on_error(&mut self, socket: SocketId) -> Vec<ConnectionAction> {
        let Some(current) = self.current_mut(socket) else {
            return Vec::new();
        };
        current.readiness = Readiness::Errored;
        self.in_flight = false;
        self.connected = false;
        Vec::new()
    }

    /// Socket closed with `code`.
    ///
    /// Always reports [`ConnectionAction::Disconnected`] for the current
    /// socket. A normal close is terminal; any other code claims a retry or,
    /// once the budget is spent, reports exhaustion one time.
    pub fn on_closed(
        &mut self,
        socket: SocketId,
        code: CloseCode,
        reason: impl Into<String>,
    ) -> Vec<ConnectionAction> {
        if self.current_mut(socket).is_none() {
            return Vec::new();
        }
        self.socket = None;
        self.in_flight = false;
        self.connected = false;

        let mut actions = vec![ConnectionAction::Disconnected { code, reason: reason.into() }];
        if code.is_normal() {
            return actions;
        }

        match self.reconnect.next_delay() {
            Some(delay) => {
                if let Some(timer) = self.timer.take() {
                    actions.push(ConnectionAction::CancelReconnect { timer });
                }
                self.next_timer += 1;
                let timer = TimerId(self.next_timer);
                self.timer = Some(timer);
                actions.push(ConnectionAction::ScheduleReconnect {
                    timer,
                    delay,
                    attempt: self.reconnect.attempts(),
                });
            },
            None if !self.exhaustion_reported => {
                self.exhaustion_reported = true;
                actions.push(ConnectionAction::ReconnectExhausted {
                    attempts: self.reconnect.attempts(),
                });
            },
            None => {},
        }
        actions
    }

    /// Intentional disconnect.
    ///
    /// Cancels the retry timer before closing the socket with a normal close,
    /// then spends the retry budget so nothing reconnects. The socket's own
    /// close event is stale from here on, so [`ConnectionAction::Disconnected`]
    /// is reported immediately. Calling this again does nothing.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();
        if let Some(timer) = self.timer.take() {
            actions.push(ConnectionAction::CancelReconnect { timer });
        }
        if let Some(socket) = self.socket.take() {
            actions.push(ConnectionAction::CloseSocket {
                socket: socket.id,
                code: CloseCode::NORMAL,
                reason: INTENTIONAL_DISCONNECT_REASON.to_owned(),
            });
            actions.push(ConnectionAction::Disconnected {
                code: CloseCode::NORMAL,
                reason: INTENTIONAL_DISCONNECT_REASON.to_owned(),
            });
        }
        self.in_flight = false;
        self.connected = false;
        self.reconnect.exhaust();
        self.exhaustion_reported = true;
        actions
    }

    fn current_mut(&mut self, socket: SocketId) -> Option<&mut Socket> {
        match self.socket.as_mut() {
            Some(current) if current.id == socket => Some(current),
            _ => {
                tracing::debug!(%socket, "ignoring event for stale socket");
                None
            },
        }
    }
}
