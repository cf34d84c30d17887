//! Session client state machine.
//!
//! Combines the connection lifecycle from [`debate_core`] with frame dispatch,
//! the locally held [`SessionView`] and the outbound chat actions.

use std::{ops::Sub, sync::Arc, time::Duration};

use debate_core::{
    ClientConfig, Connection, ConnectionAction, ConnectionState, CredentialStore,
    error::ConnectError,
};
use debate_proto::{ChatMessage, ClientFrame, Participant, ServerFrame, SessionId, TypingUser};

use crate::{
    error::SendError,
    event::{ClientAction, ClientEvent, SessionEvent},
    session::{SessionSnapshot, SessionView},
};

/// Realtime client for one debate session.
///
/// Pure state machine: feed it [`ClientEvent`]s with the current instant and
/// execute the [`ClientAction`]s it returns. Constructing it opens nothing.
///
/// Generic over `I` so the dedup window can run on virtual time.
pub struct SessionClient<I = std::time::Instant> {
    connection: Connection,
    view: SessionView<I>,
    credentials: Arc<dyn CredentialStore>,
}

impl<I> SessionClient<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a client bound to `session`.
    pub fn new(
        session: SessionId,
        config: &ClientConfig,
        credentials: impl CredentialStore + 'static,
    ) -> Self {
        Self {
            connection: Connection::new(session, config),
            view: SessionView::new(config.dedup_window),
            credentials: Arc::new(credentials),
        }
    }

    /// Open a socket unless one is open or opening, or there is no token.
    ///
    /// A suppressed connect is logged and returns no actions.
    pub fn connect(&mut self) -> Vec<ClientAction> {
        match self.try_connect() {
            Ok(actions) => actions,
            Err(error) => {
                tracing::warn!(session = %self.session(), %error, "connect suppressed");
                Vec::new()
            },
        }
    }

    /// [`SessionClient::connect`], returning the reason when nothing happens.
    pub fn try_connect(&mut self) -> Result<Vec<ClientAction>, ConnectError> {
        let actions = self.connection.connect(self.credentials.as_ref())?;
        tracing::info!(
            session = %self.session(),
            uri = %self.connection.redacted_uri(),
            "connecting"
        );
        Ok(self.lift(actions))
    }

    /// Close the socket for good and cancel any pending retry. Idempotent.
    pub fn disconnect(&mut self) -> Vec<ClientAction> {
        let actions = self.connection.disconnect();
        if !actions.is_empty() {
            tracing::info!(session = %self.session(), "disconnecting");
        }
        self.lift(actions)
    }

    /// Process one socket or timer event.
    pub fn handle(&mut self, event: ClientEvent, now: I) -> Vec<ClientAction> {
        match event {
            ClientEvent::SocketOpened { socket } => {
                let actions = self.connection.on_opened(socket);
                if !actions.is_empty() {
                    tracing::info!(session = %self.session(), %socket, "connected");
                }
                self.lift(actions)
            },
            ClientEvent::FrameReceived { socket, text } => {
                if self.connection.socket() != Some(socket) {
                    tracing::debug!(%socket, "dropping frame from stale socket");
                    return Vec::new();
                }
                self.handle_frame(&text, now)
            },
            ClientEvent::SocketClosed { socket, code, reason } => {
                let actions = self.connection.on_closed(socket, code, reason);
                if !actions.is_empty() {
                    tracing::info!(session = %self.session(), %socket, %code, "socket closed");
                }
                self.lift(actions)
            },
            ClientEvent::SocketError { socket, message } => {
                if self.connection.socket() == Some(socket) {
                    tracing::warn!(session = %self.session(), %socket, error = %message, "socket error");
                }
                let actions = self.connection.on_error(socket);
                self.lift(actions)
            },
            ClientEvent::ReconnectDue { timer } => {
                match self.connection.reconnect_due(timer, self.credentials.as_ref()) {
                    Ok(actions) => {
                        if !actions.is_empty() {
                            tracing::info!(
                                session = %self.session(),
                                attempt = self.connection.attempts(),
                                uri = %self.connection.redacted_uri(),
                                "reconnecting"
                            );
                        }
                        self.lift(actions)
                    },
                    Err(error) => {
                        tracing::warn!(session = %self.session(), %error, "reconnect suppressed");
                        Vec::new()
                    },
                }
            },
        }
    }

    /// Send a chat message.
    pub fn send_message(&mut self, message: impl Into<String>) -> Vec<ClientAction> {
        let frame = ClientFrame::Message { message: message.into(), session_id: self.session() };
        self.send(frame)
    }

    /// Announce that the local user started or stopped typing.
    pub fn send_typing(&mut self, typing: bool) -> Vec<ClientAction> {
        self.send(ClientFrame::typing(typing, self.session()))
    }

    /// React to a message.
    pub fn send_reaction(&mut self, message_id: u64, emoji: impl Into<String>) -> Vec<ClientAction> {
        let frame = ClientFrame::MessageReaction {
            message_id,
            emoji: emoji.into(),
            session_id: self.session(),
        };
        self.send(frame)
    }

    /// Send a chat message with an uploaded image.
    pub fn send_message_with_image(
        &mut self,
        message: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Vec<ClientAction> {
        let frame = ClientFrame::MessageWithImage {
            message: message.into(),
            image_url: image_url.into(),
            session_id: self.session(),
        };
        self.send(frame)
    }

    /// Announce presence in the session.
    pub fn send_join(&mut self) -> Vec<ClientAction> {
        self.send(ClientFrame::JoinDebate { session_id: self.session() })
    }

    /// Encode `frame` for the open socket.
    ///
    /// Nothing is queued or recorded locally; the server echo is what lands in
    /// the message log.
    ///
    /// # Errors
    ///
    /// - `SendError::NotConnected` if no socket is open
    /// - `SendError::Encode` if the frame fails to encode
    pub fn try_send(&self, frame: &ClientFrame) -> Result<Vec<ClientAction>, SendError> {
        let socket = self.connection.open_socket().ok_or(SendError::NotConnected)?;
        let text = frame.encode()?;
        Ok(vec![ClientAction::Transmit { socket, text }])
    }

    fn send(&self, frame: ClientFrame) -> Vec<ClientAction> {
        match self.try_send(&frame) {
            Ok(actions) => actions,
            Err(error) => {
                tracing::error!(session = %self.session(), %error, "cannot send frame");
                Vec::new()
            },
        }
    }

    fn handle_frame(&mut self, text: &str, now: I) -> Vec<ClientAction> {
        let frame = match ServerFrame::decode(text) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::warn!(session = %self.session(), %error, "dropping malformed frame");
                return Vec::new();
            },
        };
        tracing::debug!(kind = frame.kind(), "frame received");

        let mut actions = Vec::with_capacity(2);
        match &frame {
            ServerFrame::Message(message) => {
                if !self.view.record_message(message.clone(), now) {
                    tracing::debug!(user_id = message.user_id, "duplicate message kept out of log");
                }
            },
            ServerFrame::UserJoined(change) | ServerFrame::UserLeft(change) => {
                if let Some(participants) = &change.participants {
                    self.view.replace_participants(participants.clone());
                    actions.push(ClientAction::Notify(SessionEvent::ParticipantsUpdated(
                        participants.clone(),
                    )));
                }
            },
            ServerFrame::TypingStatus(status) => {
                if let Some(typing_users) = &status.typing_users {
                    self.view.replace_typing_users(typing_users.clone());
                    actions.push(ClientAction::Notify(SessionEvent::TypingUpdated(
                        typing_users.clone(),
                    )));
                }
            },
            ServerFrame::MessageReaction(_)
            | ServerFrame::ConnectionEstablished(_)
            | ServerFrame::Other { .. } => {},
        }
        actions.push(ClientAction::Notify(SessionEvent::Frame(frame)));
        actions
    }

    fn lift(&self, actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
        actions
            .into_iter()
            .map(|action| match action {
                ConnectionAction::OpenSocket { socket, uri } => {
                    ClientAction::OpenSocket { socket, uri }
                },
                ConnectionAction::CloseSocket { socket, code, reason } => {
                    ClientAction::CloseSocket { socket, code, reason }
                },
                ConnectionAction::ScheduleReconnect { timer, delay, attempt } => {
                    ClientAction::ScheduleReconnect { timer, delay, attempt }
                },
                ConnectionAction::CancelReconnect { timer } => {
                    ClientAction::CancelReconnect { timer }
                },
                ConnectionAction::Connected => ClientAction::Notify(SessionEvent::Connected),
                ConnectionAction::Disconnected { code, reason } => {
                    ClientAction::Notify(SessionEvent::Disconnected { code, reason })
                },
                ConnectionAction::ReconnectExhausted { attempts } => {
                    tracing::warn!(session = %self.session(), attempts, "reconnect attempts exhausted");
                    ClientAction::Notify(SessionEvent::ReconnectExhausted { attempts })
                },
            })
            .collect()
    }

    /// Session this client is bound to.
    pub fn session(&self) -> SessionId {
        self.connection.session()
    }

    /// Connection lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether the socket is open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Whether an open is in flight.
    pub fn is_connecting(&self) -> bool {
        self.connection.is_connecting()
    }

    /// Reconnect attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.connection.attempts()
    }

    /// Chat log.
    pub fn messages(&self) -> &[ChatMessage] {
        self.view.messages()
    }

    /// Current roster.
    pub fn participants(&self) -> &[Participant] {
        self.view.participants()
    }

    /// Users currently typing.
    pub fn typing_users(&self) -> &[TypingUser] {
        self.view.typing_users()
    }

    /// Everything a consumer displays. The chat log is shared, not copied.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session(),
            state: self.state(),
            connected: self.is_connected(),
            reconnect_attempts: self.reconnect_attempts(),
            messages: self.view.shared_messages(),
            participants: self.view.participants().to_vec(),
            typing_users: self.view.typing_users().to_vec(),
        }
    }
}
