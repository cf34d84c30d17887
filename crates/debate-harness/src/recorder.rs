//! Listener that records every session event.

use std::sync::{Arc, Mutex, PoisonError};

use debate_client::{SessionEvent, SessionListener};
use debate_proto::{CloseCode, Participant, ServerFrame, TypingUser};

/// Shared, inspectable list of recorded events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SessionEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&SessionEvent) -> bool) -> usize {
        let events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.iter().filter(|e| predicate(e)).count()
    }

    /// Number of `Connected` events.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.count(|e| matches!(e, SessionEvent::Connected))
    }

    /// Number of `Disconnected` events.
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.count(|e| matches!(e, SessionEvent::Disconnected { .. }))
    }

    /// Number of delivered frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.count(|e| matches!(e, SessionEvent::Frame(_)))
    }

    /// Number of `ReconnectExhausted` events.
    #[must_use]
    pub fn exhaustions(&self) -> usize {
        self.count(|e| matches!(e, SessionEvent::ReconnectExhausted { .. }))
    }
}

/// [`SessionListener`] that appends to an [`EventLog`].
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    log: EventLog,
}

impl RecordingListener {
    /// Listener and the log it writes to.
    #[must_use]
    pub fn new() -> (Self, EventLog) {
        let log = EventLog::new();
        (Self { log: log.clone() }, log)
    }
}

impl SessionListener for RecordingListener {
    fn on_message(&mut self, frame: &ServerFrame) {
        self.log.push(SessionEvent::Frame(frame.clone()));
    }

    fn on_connect(&mut self) {
        self.log.push(SessionEvent::Connected);
    }

    fn on_disconnect(&mut self, code: CloseCode, reason: &str) {
        self.log.push(SessionEvent::Disconnected { code, reason: reason.to_owned() });
    }

    fn on_participants_update(&mut self, participants: &[Participant]) {
        self.log.push(SessionEvent::ParticipantsUpdated(participants.to_vec()));
    }

    fn on_typing(&mut self, typing_users: &[TypingUser]) {
        self.log.push(SessionEvent::TypingUpdated(typing_users.to_vec()));
    }

    fn on_reconnect_exhausted(&mut self, attempts: u32) {
        self.log.push(SessionEvent::ReconnectExhausted { attempts });
    }
}
