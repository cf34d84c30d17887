//! Headless terminal client for debate sessions.
//!
//! Joins one session over the WebSocket transport, prints every event to
//! stdout and turns stdin lines into outbound actions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod console;
pub mod input;
pub mod token;

pub use console::ConsoleListener;
pub use input::{Input, InputError};
pub use token::FileToken;
