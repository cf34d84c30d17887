//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`SessionClient`]: session state machine
//! - [`Driver`]: socket I/O
//! - [`SessionListener`]: the consumer
//!
//! It owns the single reconnect sleep and publishes a [`SessionSnapshot`]
//! after every step. Consumers talk to it through a [`SessionHandle`].

use std::{collections::VecDeque, future::Future, pin::Pin, time::Duration};

use debate_core::{Environment, TimerId};
use debate_proto::CloseCode;
use tokio::sync::{mpsc, watch};

use crate::{
    client::SessionClient,
    driver::Driver,
    error::RuntimeStopped,
    event::{ClientAction, ClientEvent},
    listener::{SessionListener, dispatch},
    session::SessionSnapshot,
};

/// Capacity of the command channel.
const COMMAND_CAPACITY: usize = 32;

/// Requests a [`SessionHandle`] sends to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the session socket.
    Connect,
    /// Close the session socket for good.
    Disconnect,
    /// Send a chat message.
    SendMessage(String),
    /// Start or stop typing.
    SendTyping(bool),
    /// React to a message.
    SendReaction {
        /// Message being reacted to.
        message_id: u64,
        /// Reaction emoji.
        emoji: String,
    },
    /// Send a chat message with an image.
    SendMessageWithImage {
        /// Message text.
        message: String,
        /// Uploaded image location.
        image_url: String,
    },
    /// Announce presence.
    SendJoin,
    /// Disconnect and stop the runtime.
    Shutdown,
}

type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

struct PendingReconnect {
    timer: TimerId,
    sleep: Sleep,
}

enum Step {
    Command(Command),
    Event(ClientEvent),
    Stop,
}

/// Generic runtime that drives a [`SessionClient`] through a [`Driver`].
///
/// # Type Parameters
///
/// - `D`: socket I/O driver
/// - `E`: environment providing time
/// - `L`: consumer notified of session events
pub struct Runtime<D, E, L>
where
    D: Driver,
    E: Environment,
    L: SessionListener,
{
    client: SessionClient<E::Instant>,
    driver: D,
    env: E,
    listener: L,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<SessionSnapshot>,
    reconnect: Option<PendingReconnect>,
}

impl<D, E, L> Runtime<D, E, L>
where
    D: Driver,
    E: Environment,
    L: SessionListener,
{
    /// Create a runtime and the handle that controls it.
    pub fn new(
        client: SessionClient<E::Instant>,
        driver: D,
        env: E,
        listener: L,
    ) -> (Self, SessionHandle) {
        let (command_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshots, snapshot_rx) = watch::channel(client.snapshot());
        let runtime =
            Self { client, driver, env, listener, commands, snapshots, reconnect: None };
        (runtime, SessionHandle { commands: command_tx, snapshots: snapshot_rx })
    }

    /// Run until shutdown.
    ///
    /// Stops on [`Command::Shutdown`] or when every [`SessionHandle`] is
    /// dropped. Either way the session is disconnected and the driver shut
    /// down before returning, so no socket or retry timer outlives the runtime.
    pub async fn run(mut self) {
        loop {
            let step = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => Step::Stop,
                    Some(command) => Step::Command(command),
                },
                event = self.driver.next_event() => Step::Event(event),
                timer = reconnect_fired(&mut self.reconnect) => {
                    Step::Event(ClientEvent::ReconnectDue { timer })
                },
            };

            let actions = match step {
                Step::Command(command) => self.apply(command),
                Step::Event(event) => {
                    let now = self.env.now();
                    self.client.handle(event, now)
                },
                Step::Stop => break,
            };
            self.execute(actions).await;
        }

        tracing::debug!(session = %self.client.session(), "runtime stopping");
        let actions = self.client.disconnect();
        self.execute(actions).await;
        self.driver.shutdown().await;
    }

    fn apply(&mut self, command: Command) -> Vec<ClientAction> {
        match command {
            Command::Connect => self.client.connect(),
            Command::Disconnect => self.client.disconnect(),
            Command::SendMessage(message) => self.client.send_message(message),
            Command::SendTyping(typing) => self.client.send_typing(typing),
            Command::SendReaction { message_id, emoji } => {
                self.client.send_reaction(message_id, emoji)
            },
            Command::SendMessageWithImage { message, image_url } => {
                self.client.send_message_with_image(message, image_url)
            },
            Command::SendJoin => self.client.send_join(),
            Command::Shutdown => Vec::new(),
        }
    }

    /// Execute actions in order, including any produced while executing.
    async fn execute(&mut self, actions: Vec<ClientAction>) {
        let mut pending: VecDeque<ClientAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            match action {
                ClientAction::OpenSocket { socket, uri } => {
                    if let Err(error) = self.driver.open(socket, &uri).await {
                        let reason = error.to_string();
                        let now = self.env.now();
                        pending.extend(self.client.handle(
                            ClientEvent::SocketError { socket, message: reason.clone() },
                            now,
                        ));
                        pending.extend(self.client.handle(
                            ClientEvent::SocketClosed { socket, code: CloseCode::ABNORMAL, reason },
                            now,
                        ));
                    }
                },
                ClientAction::Transmit { socket, text } => {
                    if let Err(error) = self.driver.transmit(socket, text).await {
                        tracing::warn!(%socket, %error, "transmit failed");
                    }
                },
                ClientAction::CloseSocket { socket, code, reason } => {
                    if let Err(error) = self.driver.close(socket, code, &reason).await {
                        tracing::debug!(%socket, %error, "close failed");
                    }
                },
                ClientAction::ScheduleReconnect { timer, delay, attempt } => {
                    tracing::info!(attempt, ?delay, "reconnect scheduled");
                    self.reconnect = Some(PendingReconnect { timer, sleep: self.sleep(delay) });
                },
                ClientAction::CancelReconnect { timer } => {
                    if self.reconnect.as_ref().is_some_and(|p| p.timer == timer) {
                        self.reconnect = None;
                    }
                },
                ClientAction::Notify(event) => dispatch(&mut self.listener, &event),
            }
        }

        self.snapshots.send_replace(self.client.snapshot());
    }

    fn sleep(&self, delay: Duration) -> Sleep {
        let env = self.env.clone();
        Box::pin(async move { env.sleep(delay).await })
    }

    /// Client state machine.
    pub fn client(&self) -> &SessionClient<E::Instant> {
        &self.client
    }

    /// Consumer.
    pub fn listener(&self) -> &L {
        &self.listener
    }
}

/// Resolve when the pending reconnect sleep elapses; pend while none is set.
///
/// Cancel-safe: the sleep stays in `slot` if the future is dropped early.
async fn reconnect_fired(slot: &mut Option<PendingReconnect>) -> TimerId {
    match slot {
        Some(pending) => {
            pending.sleep.as_mut().await;
            let timer = pending.timer;
            *slot = None;
            timer
        },
        None => std::future::pending().await,
    }
}

/// Controls a running [`Runtime`].
///
/// Cloneable. The runtime stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queue a command.
    pub async fn send(&self, command: Command) -> Result<(), RuntimeStopped> {
        self.commands.send(command).await.map_err(|_| RuntimeStopped)
    }

    /// Open the session socket.
    pub async fn connect(&self) -> Result<(), RuntimeStopped> {
        self.send(Command::Connect).await
    }

    /// Close the session socket for good.
    pub async fn disconnect(&self) -> Result<(), RuntimeStopped> {
        self.send(Command::Disconnect).await
    }

    /// Send a chat message.
    pub async fn send_message(&self, message: impl Into<String>) -> Result<(), RuntimeStopped> {
        self.send(Command::SendMessage(message.into())).await
    }

    /// Start or stop typing.
    pub async fn send_typing(&self, typing: bool) -> Result<(), RuntimeStopped> {
        self.send(Command::SendTyping(typing)).await
    }

    /// React to a message.
    pub async fn send_reaction(
        &self,
        message_id: u64,
        emoji: impl Into<String>,
    ) -> Result<(), RuntimeStopped> {
        self.send(Command::SendReaction { message_id, emoji: emoji.into() }).await
    }

    /// Send a chat message with an image.
    pub async fn send_message_with_image(
        &self,
        message: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Result<(), RuntimeStopped> {
        self.send(Command::SendMessageWithImage {
            message: message.into(),
            image_url: image_url.into(),
        })
        .await
    }

    /// Announce presence.
    pub async fn send_join(&self) -> Result<(), RuntimeStopped> {
        self.send(Command::SendJoin).await
    }

    /// Disconnect and stop the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeStopped> {
        self.send(Command::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}
