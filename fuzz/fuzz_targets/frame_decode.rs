//! Fuzz target for ServerFrame::decode
//!
//! Arbitrary text must never panic the decoder. Whatever decodes must encode
//! again and decode to a frame with the same tag.

#![no_main]

use debate_proto::ServerFrame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(frame) = ServerFrame::decode(text) else {
        return;
    };

    let encoded = frame.encode().expect("decoded frame must encode");
    let again = ServerFrame::decode(&encoded).expect("encoded frame must decode");
    assert_eq!(frame.kind(), again.kind());
});
