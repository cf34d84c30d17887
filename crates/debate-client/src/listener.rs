//! Consumer notification.
//!
//! A consumer implements [`SessionListener`] for the hooks it cares about, or
//! registers closures on [`Callbacks`]. Every hook is optional.

use debate_proto::{CloseCode, Participant, ServerFrame, TypingUser};

use crate::event::SessionEvent;

/// Receives session events. All methods default to doing nothing.
pub trait SessionListener: Send {
    /// A frame arrived. Called for every decoded frame, unknown tags included.
    fn on_message(&mut self, _frame: &ServerFrame) {}

    /// The socket opened.
    fn on_connect(&mut self) {}

    /// The socket closed.
    fn on_disconnect(&mut self, _code: CloseCode, _reason: &str) {}

    /// The roster was replaced.
    fn on_participants_update(&mut self, _participants: &[Participant]) {}

    /// The typing set was replaced.
    fn on_typing(&mut self, _typing_users: &[TypingUser]) {}

    /// Reconnection gave up after `attempts` attempts.
    fn on_reconnect_exhausted(&mut self, _attempts: u32) {}
}

impl SessionListener for () {}

/// Route one event to the matching listener hook.
pub fn dispatch<L: SessionListener + ?Sized>(listener: &mut L, event: &SessionEvent) {
    match event {
        SessionEvent::Connected => listener.on_connect(),
        SessionEvent::Disconnected { code, reason } => listener.on_disconnect(*code, reason),
        SessionEvent::Frame(frame) => listener.on_message(frame),
        SessionEvent::ParticipantsUpdated(participants) => {
            listener.on_participants_update(participants);
        },
        SessionEvent::TypingUpdated(typing) => listener.on_typing(typing),
        SessionEvent::ReconnectExhausted { attempts } => listener.on_reconnect_exhausted(*attempts),
    }
}

/// Closure-based listener.
///
/// ```
/// use debate_client::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .on_connect(|| {})
///     .on_message(|frame| {
///         let _ = frame.kind();
///     });
/// # drop(callbacks);
/// ```
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct Callbacks {
    message: Option<Box<dyn FnMut(&ServerFrame) + Send>>,
    connect: Option<Box<dyn FnMut() + Send>>,
    disconnect: Option<Box<dyn FnMut(CloseCode, &str) + Send>>,
    participants: Option<Box<dyn FnMut(&[Participant]) + Send>>,
    typing: Option<Box<dyn FnMut(&[TypingUser]) + Send>>,
    exhausted: Option<Box<dyn FnMut(u32) + Send>>,
}

impl Callbacks {
    /// No callbacks registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every decoded frame.
    #[must_use]
    pub fn on_message(mut self, f: impl FnMut(&ServerFrame) + Send + 'static) -> Self {
        self.message = Some(Box::new(f));
        self
    }

    /// Called when the socket opens.
    #[must_use]
    pub fn on_connect(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.connect = Some(Box::new(f));
        self
    }

    /// Called on every close.
    #[must_use]
    pub fn on_disconnect(mut self, f: impl FnMut(CloseCode, &str) + Send + 'static) -> Self {
        self.disconnect = Some(Box::new(f));
        self
    }

    /// Called with the new roster.
    #[must_use]
    pub fn on_participants_update(
        mut self,
        f: impl FnMut(&[Participant]) + Send + 'static,
    ) -> Self {
        self.participants = Some(Box::new(f));
        self
    }

    /// Called with the new typing set.
    #[must_use]
    pub fn on_typing(mut self, f: impl FnMut(&[TypingUser]) + Send + 'static) -> Self {
        self.typing = Some(Box::new(f));
        self
    }

    /// Called once when reconnection gives up.
    #[must_use]
    pub fn on_reconnect_exhausted(mut self, f: impl FnMut(u32) + Send + 'static) -> Self {
        self.exhausted = Some(Box::new(f));
        self
    }
}

impl SessionListener for Callbacks {
    fn on_message(&mut self, frame: &ServerFrame) {
        if let Some(f) = self.message.as_mut() {
            f(frame);
        }
    }

    fn on_connect(&mut self) {
        if let Some(f) = self.connect.as_mut() {
            f();
        }
    }

    fn on_disconnect(&mut self, code: CloseCode, reason: &str) {
        if let Some(f) = self.disconnect.as_mut() {
            f(code, reason);
        }
    }

    fn on_participants_update(&mut self, participants: &[Participant]) {
        if let Some(f) = self.participants.as_mut() {
            f(participants);
        }
    }

    fn on_typing(&mut self, typing_users: &[TypingUser]) {
        if let Some(f) = self.typing.as_mut() {
            f(typing_users);
        }
    }

    fn on_reconnect_exhausted(&mut self, attempts: u32) {
        if let Some(f) = self.exhausted.as_mut() {
            f(attempts);
        }
    }
}
