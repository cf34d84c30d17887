//! Outbound actions as they reach the wire.

use std::time::Instant;

use debate_client::{ClientAction, ClientConfig, ClientEvent, SessionClient, SocketId, StaticToken};
use debate_proto::SessionId;
use proptest::prelude::*;

fn client(session: u64) -> SessionClient<Instant> {
    let session = SessionId::new(session).unwrap();
    SessionClient::new(session, &ClientConfig::default(), StaticToken::new("t"))
}

#[allow(clippy::disallowed_methods)]
fn now() -> Instant {
    Instant::now()
}

fn open(client: &mut SessionClient<Instant>) -> SocketId {
    let socket = match client.connect().as_slice() {
        [ClientAction::OpenSocket { socket, .. }] => *socket,
        other => panic!("expected one open, got {other:?}"),
    };
    client.handle(ClientEvent::SocketOpened { socket }, now());
    socket
}

fn wire(actions: &[ClientAction]) -> String {
    match actions {
        [ClientAction::Transmit { text, .. }] => text.clone(),
        other => panic!("expected one transmit, got {other:?}"),
    }
}

#[derive(Debug, Clone)]
enum Outbound {
    Message(String),
    Typing(bool),
    Reaction(u64, String),
    Image(String, String),
    Join,
}

fn outbound_strategy() -> impl Strategy<Value = Outbound> {
    prop_oneof![
        ".{0,20}".prop_map(Outbound::Message),
        any::<bool>().prop_map(Outbound::Typing),
        (any::<u64>(), "\\PC{1,2}").prop_map(|(id, e)| Outbound::Reaction(id, e)),
        (".{0,20}", "https://[a-z]{1,8}\\.example/[a-z]{1,8}\\.png")
            .prop_map(|(m, u)| Outbound::Image(m, u)),
        Just(Outbound::Join),
    ]
}

fn send(client: &mut SessionClient<Instant>, action: &Outbound) -> Vec<ClientAction> {
    match action.clone() {
        Outbound::Message(m) => client.send_message(m),
        Outbound::Typing(t) => client.send_typing(t),
        Outbound::Reaction(id, emoji) => client.send_reaction(id, emoji),
        Outbound::Image(m, u) => client.send_message_with_image(m, u),
        Outbound::Join => client.send_join(),
    }
}

#[test]
fn every_outbound_action_encodes_its_frame() {
    let mut client = client(42);
    open(&mut client);

    insta::assert_snapshot!(
        wire(&client.send_message("hello")),
        @r#"{"type":"message","message":"hello","session_id":42}"#
    );
    insta::assert_snapshot!(wire(&client.send_typing(true)), @r#"{"type":"typing_start","session_id":42}"#);
    insta::assert_snapshot!(wire(&client.send_typing(false)), @r#"{"type":"typing_stop","session_id":42}"#);
    insta::assert_snapshot!(
        wire(&client.send_reaction(9, "👍")),
        @r#"{"type":"message_reaction","message_id":9,"emoji":"👍","session_id":42}"#
    );
    insta::assert_snapshot!(
        wire(&client.send_message_with_image("look", "https://cdn.example/a.png")),
        @r#"{"type":"message_with_image","message":"look","image_url":"https://cdn.example/a.png","session_id":42}"#
    );
    insta::assert_snapshot!(wire(&client.send_join()), @r#"{"type":"join_debate","session_id":42}"#);
}

proptest! {
    /// Nothing is put on the wire before the socket opens.
    #[test]
    fn prop_silent_until_open(actions in prop::collection::vec(outbound_strategy(), 1..20)) {
        let mut client = client(5);
        for action in &actions {
            prop_assert!(send(&mut client, action).is_empty());
        }

        client.connect();
        for action in &actions {
            prop_assert!(send(&mut client, action).is_empty());
        }
    }

    /// Once open, each action is one JSON frame tagged with the session id.
    #[test]
    fn prop_open_frames_carry_session(
        session in 1u64..1_000_000,
        actions in prop::collection::vec(outbound_strategy(), 1..20),
    ) {
        let mut client = client(session);
        let socket = open(&mut client);

        for action in &actions {
            let sent = send(&mut client, action);
            let [ClientAction::Transmit { socket: on, text }] = sent.as_slice() else {
                return Err(TestCaseError::fail(format!("expected one transmit, got {sent:?}")));
            };
            prop_assert_eq!(*on, socket);
            let value: serde_json::Value = serde_json::from_str(text).unwrap();
            prop_assert_eq!(value["session_id"].as_u64(), Some(session));
            prop_assert!(value["type"].is_string());
        }
        prop_assert!(client.messages().is_empty());
    }
}
