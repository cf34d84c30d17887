//! Locally held session state.
//!
//! The view is what a consumer renders: the chat log, the participant roster
//! and who is typing. Rosters are replaced wholesale by each update, never
//! merged.

use std::{collections::VecDeque, ops::Sub, sync::Arc, time::Duration};

use debate_core::ConnectionState;
use debate_proto::{ChatMessage, Participant, SessionId, TypingUser};

/// Message log, roster and typing set for one session.
///
/// Chat messages repeated within the dedup window are kept out of the log.
/// The window is measured from when the first copy was received.
///
/// The log is shared with the snapshots taken from it and only copied when
/// a message is appended while a snapshot still holds it.
#[derive(Debug, Clone)]
pub struct SessionView<I> {
    messages: Arc<Vec<ChatMessage>>,
    participants: Vec<Participant>,
    typing_users: Vec<TypingUser>,
    /// Messages received inside the window, oldest first.
    recent: VecDeque<(I, ChatMessage)>,
    dedup_window: Duration,
}

impl<I> SessionView<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Empty view with the given dedup window. A zero window keeps every
    /// message.
    #[must_use]
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            messages: Arc::default(),
            participants: Vec::new(),
            typing_users: Vec::new(),
            recent: VecDeque::new(),
            dedup_window,
        }
    }

    /// Append `message` to the log unless it repeats one received within the
    /// window. Returns whether it was appended.
    pub fn record_message(&mut self, message: ChatMessage, now: I) -> bool {
        if self.dedup_window.is_zero() {
            Arc::make_mut(&mut self.messages).push(message);
            return true;
        }

        let window = self.dedup_window;
        while self.recent.front().is_some_and(|(at, _)| now - *at > window) {
            self.recent.pop_front();
        }
        if self.recent.iter().any(|(_, seen)| seen.same_content(&message)) {
            return false;
        }

        self.recent.push_back((now, message.clone()));
        Arc::make_mut(&mut self.messages).push(message);
        true
    }

    /// Replace the roster.
    pub fn replace_participants(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    /// Replace the typing set.
    pub fn replace_typing_users(&mut self, typing_users: Vec<TypingUser>) {
        self.typing_users = typing_users;
    }

    /// Chat log in arrival order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Shared handle to the chat log.
    #[must_use]
    pub fn shared_messages(&self) -> Arc<Vec<ChatMessage>> {
        Arc::clone(&self.messages)
    }

    /// Current roster.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Users currently typing.
    #[must_use]
    pub fn typing_users(&self) -> &[TypingUser] {
        &self.typing_users
    }
}

/// Point-in-time copy of everything a consumer displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session the client is bound to.
    pub session: SessionId,
    /// Connection lifecycle state.
    pub state: ConnectionState,
    /// Whether the socket is open.
    pub connected: bool,
    /// Reconnect attempts since the last successful open.
    pub reconnect_attempts: u32,
    /// Chat log, shared with the client that produced the snapshot.
    pub messages: Arc<Vec<ChatMessage>>,
    /// Roster.
    pub participants: Vec<Participant>,
    /// Typing set.
    pub typing_users: Vec<TypingUser>,
}

impl SessionSnapshot {
    /// Snapshot of a client that has not connected yet.
    #[must_use]
    pub fn empty(session: SessionId) -> Self {
        Self {
            session,
            state: ConnectionState::Idle,
            connected: false,
            reconnect_attempts: 0,
            messages: Arc::default(),
            participants: Vec::new(),
            typing_users: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn chat(text: &str) -> ChatMessage {
        ChatMessage {
            user_id: 1,
            username: "ada".to_owned(),
            message: text.to_owned(),
            timestamp: Some("t".to_owned()),
            emoji_reactions: None,
            image_url: None,
        }
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn duplicate_inside_window_is_dropped() {
        let mut view = SessionView::new(Duration::from_secs(2));
        let t0 = Instant::now();

        assert!(view.record_message(chat("hi"), t0));
        assert!(!view.record_message(chat("hi"), t0 + Duration::from_millis(1500)));
        assert!(view.record_message(chat("other"), t0 + Duration::from_millis(1600)));

        assert_eq!(view.messages().len(), 2);
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn duplicate_after_window_is_kept() {
        let mut view = SessionView::new(Duration::from_secs(2));
        let t0 = Instant::now();

        view.record_message(chat("hi"), t0);
        assert!(view.record_message(chat("hi"), t0 + Duration::from_millis(2500)));
        assert_eq!(view.messages().len(), 2);
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn zero_window_keeps_everything() {
        let mut view = SessionView::new(Duration::ZERO);
        let t0 = Instant::now();

        view.record_message(chat("hi"), t0);
        view.record_message(chat("hi"), t0);
        assert_eq!(view.messages().len(), 2);
    }

    #[test]
    #[allow(clippy::disallowed_methods)]
    fn shared_log_survives_later_appends() {
        let mut view = SessionView::new(Duration::ZERO);
        let t0 = Instant::now();
        view.record_message(chat("first"), t0);

        let held = view.shared_messages();
        assert!(Arc::ptr_eq(&held, &view.shared_messages()));

        view.record_message(chat("second"), t0);

        assert_eq!(held.len(), 1);
        assert_eq!(view.messages().len(), 2);
        assert!(!Arc::ptr_eq(&held, &view.shared_messages()));
    }

    #[test]
    fn rosters_are_replaced() {
        let mut view: SessionView<Instant> = SessionView::new(Duration::ZERO);
        view.replace_participants(vec![
            Participant { id: 1, username: "a".into(), is_online: None },
            Participant { id: 2, username: "b".into(), is_online: None },
        ]);
        view.replace_participants(vec![Participant {
            id: 3,
            username: "c".into(),
            is_online: None,
        }]);

        assert_eq!(view.participants().len(), 1);
        assert_eq!(view.participants()[0].id, 3);
    }
}
