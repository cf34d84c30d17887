//! Fuzz target for the Connection state machine
//!
//! # Strategy
//!
//! - Socket events aimed at the current socket and at stale ones
//! - Timer firings for current, cancelled and never-issued timers
//! - Every close code, normal and abnormal
//!
//! # Invariants
//!
//! - At most one socket is requested without a close in between
//! - Attempts never exceed the budget
//! - Exhaustion is reported at most once between consumer connects
//! - After disconnect nothing opens until the next connect

#![no_main]

use arbitrary::Arbitrary;
use debate_core::{
    ClientConfig, Connection, ConnectionAction, SocketId, StaticToken, TimerId,
};
use debate_proto::{CloseCode, SessionId};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Connect,
    Disconnect,
    Opened(Target),
    Closed(Target, u16),
    Errored(Target),
    TimerFired(u8),
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Target {
    Current,
    Stale(u8),
    Unknown(u64),
}

fuzz_target!(|ops: Vec<Op>| {
    let config = ClientConfig::default();
    let mut conn = Connection::new(SessionId::new(1).unwrap(), &config);
    let token = StaticToken::new("t");

    let mut sockets: Vec<SocketId> = Vec::new();
    let mut timers: Vec<TimerId> = Vec::new();
    let mut awaiting_close = false;
    let mut exhaustions = 0;
    let mut disconnected = false;

    for op in ops {
        let pick = |target: Target| match target {
            Target::Current => sockets.last().copied(),
            Target::Stale(back) => sockets.len().checked_sub(2 + back as usize).map(|i| sockets[i]),
            Target::Unknown(raw) => Some(SocketId::from_raw(raw)),
        };

        let actions = match op {
            Op::Connect => {
                disconnected = false;
                exhaustions = 0;
                conn.connect(&token).unwrap_or_default()
            },
            Op::Disconnect => {
                disconnected = true;
                conn.disconnect()
            },
            Op::Opened(target) => pick(target).map(|s| conn.on_opened(s)).unwrap_or_default(),
            Op::Closed(target, code) => {
                let socket = pick(target);
                let actions = socket
                    .map(|s| conn.on_closed(s, CloseCode::new(code), ""))
                    .unwrap_or_default();
                if actions.iter().any(|a| matches!(a, ConnectionAction::Disconnected { .. })) {
                    awaiting_close = false;
                }
                actions
            },
            Op::Errored(target) => pick(target).map(|s| conn.on_error(s)).unwrap_or_default(),
            Op::TimerFired(back) => {
                let timer = timers.len().checked_sub(1 + back as usize).map(|i| timers[i]);
                timer.map(|t| conn.reconnect_due(t, &token).unwrap_or_default()).unwrap_or_default()
            },
        };

        for action in &actions {
            match action {
                ConnectionAction::OpenSocket { socket, .. } => {
                    assert!(!awaiting_close, "second socket requested before the first closed");
                    assert!(!disconnected, "socket requested after disconnect");
                    sockets.push(*socket);
                    awaiting_close = true;
                },
                ConnectionAction::CloseSocket { .. } => awaiting_close = false,
                ConnectionAction::ScheduleReconnect { timer, .. } => timers.push(*timer),
                ConnectionAction::ReconnectExhausted { .. } => exhaustions += 1,
                _ => {},
            }
        }

        assert!(conn.attempts() <= config.max_reconnect_attempts);
        assert!(exhaustions <= 1, "exhaustion reported twice");
    }
});
