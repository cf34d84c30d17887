//! Line-oriented event output.

use std::io::Write;

use debate_client::SessionListener;
use debate_proto::{CloseCode, Participant, ServerFrame, TypingUser};

/// Writes one line per session event.
///
/// Typing updates arrive both as a frame and as a typing-set replacement; only
/// the latter is printed. Same for rosters.
pub struct ConsoleListener<W> {
    out: W,
}

impl<W: Write + Send> ConsoleListener<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(error) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::warn!(%error, "cannot write event");
        }
    }
}

fn names<'a>(iter: impl Iterator<Item = &'a str>) -> String {
    let joined: Vec<_> = iter.collect();
    if joined.is_empty() { "nobody".to_owned() } else { joined.join(", ") }
}

impl<W: Write + Send> SessionListener for ConsoleListener<W> {
    fn on_message(&mut self, frame: &ServerFrame) {
        let text = match frame {
            ServerFrame::Message(m) => match &m.image_url {
                Some(url) => format!("[{}] {} <{url}>", m.username, m.message),
                None => format!("[{}] {}", m.username, m.message),
            },
            ServerFrame::UserJoined(change) => format!("* {} joined", change.username),
            ServerFrame::UserLeft(change) => format!("* {} left", change.username),
            ServerFrame::MessageReaction(r) => {
                let who = r.username.as_deref().unwrap_or("someone");
                format!("* {who} reacted {} to #{}", r.emoji, r.message_id)
            },
            ServerFrame::ConnectionEstablished(greeting) => {
                format!("* {} (signed in as {})", greeting.message, greeting.username)
            },
            ServerFrame::TypingStatus(_) => return,
            ServerFrame::Other { kind, .. } => {
                tracing::debug!(kind, "unhandled frame");
                return;
            },
        };
        self.line(&text);
    }

    fn on_connect(&mut self) {
        self.line("* connected");
    }

    fn on_disconnect(&mut self, code: CloseCode, reason: &str) {
        if reason.is_empty() {
            self.line(&format!("* disconnected ({code})"));
        } else {
            self.line(&format!("* disconnected ({code}): {reason}"));
        }
    }

    fn on_participants_update(&mut self, participants: &[Participant]) {
        let list = names(participants.iter().map(|p| p.username.as_str()));
        self.line(&format!("* participants: {list}"));
    }

    fn on_typing(&mut self, typing_users: &[TypingUser]) {
        let list = names(typing_users.iter().map(|u| u.username.as_str()));
        self.line(&format!("* typing: {list}"));
    }

    fn on_reconnect_exhausted(&mut self, attempts: u32) {
        self.line(&format!("* gave up after {attempts} reconnect attempts, /connect to retry"));
    }
}
