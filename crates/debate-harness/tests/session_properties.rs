//! Property-based tests for the session client.
//!
//! Arbitrary sequences of consumer calls and server behavior run through a
//! [`SimSession`]; the standard invariants are checked after every step.

use std::time::Duration;

use debate_client::{ClientConfig, ConnectionState, SessionEvent, SocketId, StaticToken};
use debate_harness::{InvariantRegistry, SimInstant, SimSession};
use debate_proto::{
    ChatMessage, CloseCode, MembershipChange, Participant, ServerFrame, SessionId, TypingStatus,
    TypingUser,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Connect,
    Disconnect,
    Accept,
    Close(u16),
    Fail,
    Send,
    Advance(u64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => Just(Step::Connect),
        1 => Just(Step::Disconnect),
        3 => Just(Step::Accept),
        3 => prop_oneof![Just(1000u16), Just(1001), Just(1005), Just(1006), Just(4001)]
            .prop_map(Step::Close),
        1 => Just(Step::Fail),
        2 => Just(Step::Send),
        3 => (0u64..5_000).prop_map(Step::Advance),
    ]
}

fn session() -> SimSession {
    SimSession::new(SessionId::new(42).unwrap(), &ClientConfig::default(), StaticToken::new("t"))
}

fn apply(sim: &mut SimSession, step: &Step) {
    match step {
        Step::Connect => sim.connect(),
        Step::Disconnect => sim.disconnect(),
        Step::Accept => {
            sim.accept_latest();
        },
        Step::Close(code) => {
            if let Some(socket) = sim.latest_socket() {
                sim.close(socket, CloseCode::new(*code), "");
            }
        },
        Step::Fail => {
            if let Some(socket) = sim.latest_socket() {
                sim.fail(socket, "reset");
            }
        },
        Step::Send => sim.send_message("hi"),
        Step::Advance(ms) => sim.advance(Duration::from_millis(*ms)),
    }
}

fn participant(id: u64) -> Participant {
    Participant { id, username: format!("user{id}"), is_online: Some(true) }
}

fn chat(user_id: u64, text: &str) -> ChatMessage {
    ChatMessage {
        user_id,
        username: format!("user{user_id}"),
        message: text.to_owned(),
        timestamp: None,
        emoji_reactions: None,
        image_url: None,
    }
}

fn open_session() -> (SimSession, SocketId) {
    let mut sim = session();
    sim.connect();
    let socket = sim.accept_latest().unwrap();
    (sim, socket)
}

proptest! {
    /// Session invariants hold under arbitrary event sequences.
    #[test]
    fn prop_invariants_hold(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut sim = session();
        let invariants = InvariantRegistry::standard();

        for step in &steps {
            apply(&mut sim, step);
            prop_assert!(
                invariants.check_all(&sim.observe()).is_ok(),
                "Invariant violated after {:?}", step
            );
        }
    }

    /// Frames only reach the wire over an open socket.
    #[test]
    fn prop_transmits_only_when_open(steps in prop::collection::vec(step_strategy(), 0..60)) {
        let mut sim = session();

        for step in &steps {
            let connected = sim.client().is_connected();
            let before = sim.transmitted().len();
            apply(&mut sim, step);
            if matches!(step, Step::Send) {
                let expected = usize::from(connected);
                prop_assert_eq!(sim.transmitted().len() - before, expected);
            }
        }
    }

    /// A disconnect is final until the consumer connects again.
    #[test]
    fn prop_disconnect_is_final(
        before in prop::collection::vec(step_strategy(), 0..30),
        after in prop::collection::vec(
            prop_oneof![
                Just(Step::Accept),
                Just(Step::Close(1006)),
                Just(Step::Fail),
                (0u64..10_000).prop_map(Step::Advance),
            ],
            0..30,
        ),
    ) {
        let mut sim = session();
        for step in &before {
            apply(&mut sim, step);
        }

        sim.disconnect();
        let opens = sim.opened().len();
        for step in &after {
            apply(&mut sim, step);
        }

        prop_assert_eq!(sim.opened().len(), opens);
        prop_assert!(!sim.client().is_connected());
        prop_assert!(sim.pending_timers().is_empty());
    }

    /// The roster always equals the latest list the server sent.
    #[test]
    fn prop_roster_is_replaced_not_merged(
        rosters in prop::collection::vec(prop::collection::vec(1u64..50, 0..8), 1..10),
    ) {
        let (mut sim, socket) = open_session();

        for ids in &rosters {
            let participants: Vec<_> = ids.iter().copied().map(participant).collect();
            let frame = ServerFrame::UserJoined(MembershipChange {
                user_id: None,
                username: "someone".into(),
                participants: Some(participants.clone()),
            });
            sim.deliver_frame(socket, &frame);
            prop_assert_eq!(sim.client().participants(), participants.as_slice());
        }
    }

    /// A repeat inside the window is kept out of the log; after it, appended.
    #[test]
    fn prop_dedup_respects_window(gap_ms in 0u64..5_000) {
        let (mut sim, socket) = open_session();
        let frame = ServerFrame::Message(chat(1, "same"));

        sim.deliver_frame(socket, &frame);
        sim.advance(Duration::from_millis(gap_ms));
        sim.deliver_frame(socket, &frame);

        let expected = if gap_ms <= 2_000 { 1 } else { 2 };
        prop_assert_eq!(sim.client().messages().len(), expected);
        // Every frame reaches the consumer, duplicates included
        prop_assert_eq!(sim.count(|e| matches!(e, SessionEvent::Frame(_))), 2);
    }

    /// Distinct messages are all appended in arrival order.
    #[test]
    fn prop_distinct_messages_all_logged(texts in prop::collection::btree_set("[a-z]{1,8}", 0..20)) {
        let (mut sim, socket) = open_session();

        for text in &texts {
            sim.deliver_frame(socket, &ServerFrame::Message(chat(1, text)));
        }

        let logged: Vec<_> = sim.client().messages().iter().map(|m| m.message.clone()).collect();
        let sent: Vec<_> = texts.iter().cloned().collect();
        prop_assert_eq!(logged, sent);
    }
}

#[test]
fn six_abnormal_closes_exhaust_once() {
    let mut sim = session();
    sim.connect();

    for attempt in 1..=5u32 {
        let socket = sim.latest_socket().unwrap();
        sim.close(socket, CloseCode::ABNORMAL, "unreachable");

        let closed_at = sim.now();
        assert_eq!(sim.client().reconnect_attempts(), attempt);
        assert_eq!(sim.pending_timers(), vec![closed_at + Duration::from_secs(3)]);
        sim.advance(Duration::from_secs(3));
    }

    let socket = sim.latest_socket().unwrap();
    sim.close(socket, CloseCode::ABNORMAL, "unreachable");
    sim.advance(Duration::from_secs(60));

    assert_eq!(sim.opened().len(), 6);
    assert_eq!(sim.now(), SimInstant::ZERO + Duration::from_secs(75));
    assert_eq!(sim.client().state(), ConnectionState::Terminal);
    assert_eq!(sim.count(|e| matches!(e, SessionEvent::ReconnectExhausted { attempts: 5 })), 1);
    assert_eq!(sim.count(|e| matches!(e, SessionEvent::Disconnected { .. })), 6);
}

#[test]
fn normal_close_does_not_retry() {
    let (mut sim, socket) = open_session();

    sim.close(socket, CloseCode::NORMAL, "bye");
    sim.advance(Duration::from_secs(30));

    assert_eq!(sim.opened().len(), 1);
    assert_eq!(sim.client().state(), ConnectionState::Terminal);
}

#[test]
fn typing_set_is_replaced() {
    let (mut sim, socket) = open_session();
    let alice = TypingUser { user_id: 1, username: "alice".into() };
    let bob = TypingUser { user_id: 2, username: "bob".into() };

    sim.deliver_frame(
        socket,
        &ServerFrame::TypingStatus(TypingStatus { typing_users: Some(vec![alice, bob.clone()]) }),
    );
    sim.deliver_frame(
        socket,
        &ServerFrame::TypingStatus(TypingStatus { typing_users: Some(vec![bob.clone()]) }),
    );

    assert_eq!(sim.client().typing_users(), &[bob]);
    assert_eq!(sim.count(|e| matches!(e, SessionEvent::TypingUpdated(_))), 2);
}

#[test]
fn reconnect_after_open_restores_full_budget() {
    let (mut sim, socket) = open_session();

    sim.close(socket, CloseCode::ABNORMAL, "");
    sim.advance(Duration::from_secs(3));
    let retry = sim.accept_latest().unwrap();
    assert_eq!(sim.client().reconnect_attempts(), 0);

    sim.close(retry, CloseCode::GOING_AWAY, "");
    assert_eq!(sim.client().reconnect_attempts(), 1);
}
