//! Outbound frame encodings as the backend expects them.

use debate_proto::{ClientFrame, SessionId};

fn session() -> SessionId {
    SessionId::new(42).unwrap()
}

#[test]
fn message_frame() {
    let frame = ClientFrame::Message { message: "hello".to_owned(), session_id: session() };
    insta::assert_snapshot!(frame.encode().unwrap(), @r#"{"type":"message","message":"hello","session_id":42}"#);
}

#[test]
fn message_with_image_frame() {
    let frame = ClientFrame::MessageWithImage {
        message: "look".to_owned(),
        image_url: "https://cdn.example/a.png".to_owned(),
        session_id: session(),
    };
    insta::assert_snapshot!(
        frame.encode().unwrap(),
        @r#"{"type":"message_with_image","message":"look","image_url":"https://cdn.example/a.png","session_id":42}"#
    );
}

#[test]
fn typing_frames() {
    insta::assert_snapshot!(
        ClientFrame::typing(true, session()).encode().unwrap(),
        @r#"{"type":"typing_start","session_id":42}"#
    );
    insta::assert_snapshot!(
        ClientFrame::typing(false, session()).encode().unwrap(),
        @r#"{"type":"typing_stop","session_id":42}"#
    );
}

#[test]
fn reaction_frame() {
    let frame =
        ClientFrame::MessageReaction { message_id: 9, emoji: "👍".to_owned(), session_id: session() };
    insta::assert_snapshot!(
        frame.encode().unwrap(),
        @r#"{"type":"message_reaction","message_id":9,"emoji":"👍","session_id":42}"#
    );
}

#[test]
fn join_frame() {
    let frame = ClientFrame::JoinDebate { session_id: session() };
    insta::assert_snapshot!(frame.encode().unwrap(), @r#"{"type":"join_debate","session_id":42}"#);
}

#[test]
fn every_frame_carries_session_id() {
    let frames = [
        ClientFrame::Message { message: String::new(), session_id: session() },
        ClientFrame::typing(true, session()),
        ClientFrame::JoinDebate { session_id: session() },
    ];
    for frame in frames {
        let value: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(value["session_id"], 42);
        assert_eq!(frame.session_id(), session());
    }
}
