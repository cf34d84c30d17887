//! Debate session client
//!
//! Action-based realtime client for one debate session. Owns a single socket,
//! reconnects with a bounded budget after abnormal closes, turns inbound
//! frames into typed events and exposes the outbound chat actions.
//!
//! # Architecture
//!
//! [`SessionClient`] follows the same Sans-IO pattern as [`debate_core`]. It
//! receives [`ClientEvent`]s, processes them through pure state machine logic
//! and returns [`ClientAction`]s for the caller to execute. [`Runtime`] is
//! the async loop that executes those actions through a [`Driver`] and fans
//! [`SessionEvent`]s out to a [`SessionListener`].
//!
//! # Components
//!
//! - [`SessionClient`]: connection lifecycle, frame dispatch, outbound actions
//! - [`SessionView`]: message log, participants and typing users
//! - [`SessionListener`] / [`Callbacks`]: consumer notification
//! - [`Runtime`] / [`SessionHandle`]: async orchestration and its handle
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, [`transport::WsDriver`] runs sockets
//! over `tokio-tungstenite`.

#![forbid(unsafe_code)]

mod client;
mod driver;
mod error;
mod event;
mod listener;
mod runtime;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::SessionClient;
pub use debate_core::{
    Backoff, ClientConfig, ConnectError, ConnectionState, CredentialStore, Endpoint, EnvToken,
    Environment, SocketId, StaticToken, SystemEnv, TimerId, config::DEFAULT_ENDPOINT,
};
pub use driver::Driver;
pub use error::{RuntimeStopped, SendError};
pub use event::{ClientAction, ClientEvent, SessionEvent};
pub use listener::{Callbacks, SessionListener, dispatch};
pub use runtime::{Command, Runtime, SessionHandle};
pub use session::{SessionSnapshot, SessionView};
