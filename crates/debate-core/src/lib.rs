//! Debate session core
//!
//! Pure logic for one realtime session connection: the lifecycle state
//! machine, the bounded reconnect policy, endpoint configuration and the seams
//! to the outside world (time and credentials).
//!
//! Nothing here performs I/O. [`Connection`] methods return
//! [`ConnectionAction`]s which a driver executes, and socket outcomes come
//! back in as method calls.

#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
pub mod credentials;
pub mod env;
pub mod error;
pub mod reconnect;

pub use config::{Backoff, ClientConfig, Endpoint};
pub use connection::{Connection, ConnectionAction, ConnectionState, SocketId, TimerId};
pub use credentials::{CredentialStore, EnvToken, StaticToken};
pub use env::{Environment, SystemEnv};
pub use error::{ConfigError, ConnectError};
pub use reconnect::{ReconnectPolicy, ReconnectState};
