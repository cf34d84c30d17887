//! Typed frame payloads.
//!
//! Each struct mirrors the JSON body of one inbound or outbound frame with the
//! `type` discriminator removed. Optional fields use `Option` so frames from
//! older or newer backends still decode.

pub mod chat;
pub mod presence;
pub mod session;
