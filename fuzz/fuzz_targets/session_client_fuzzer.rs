//! Fuzz target for SessionClient frame handling
//!
//! Arbitrary text delivered on the open socket must never panic and must
//! never put anything on the wire: inbound frames only update local state and
//! notify the consumer.

#![no_main]

use std::time::{Duration, Instant};

use debate_client::{ClientAction, ClientConfig, ClientEvent, SessionClient, StaticToken};
use debate_proto::SessionId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|frames: Vec<(String, u16)>| {
    let mut client: SessionClient<Instant> =
        SessionClient::new(SessionId::new(1).unwrap(), &ClientConfig::default(), StaticToken::new("t"));

    let socket = match client.connect().as_slice() {
        [ClientAction::OpenSocket { socket, .. }] => *socket,
        _ => return,
    };
    let mut now = Instant::now();
    client.handle(ClientEvent::SocketOpened { socket }, now);

    for (text, gap_ms) in frames {
        now += Duration::from_millis(u64::from(gap_ms));
        let actions = client.handle(ClientEvent::FrameReceived { socket, text }, now);
        assert!(actions.iter().all(|a| matches!(a, ClientAction::Notify(_))));
    }
    assert!(client.is_connected());
});
