//! Error types for the session core.
//!
//! None of these is fatal to the client. Connect errors mean "nothing was
//! done"; configuration errors surface before a client exists.

use thiserror::Error;

/// Reasons a connect request was suppressed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// A socket is already open.
    #[error("socket already open")]
    AlreadyActive,

    /// A socket is still opening.
    #[error("connection attempt already in flight")]
    InFlight,

    /// The previous socket failed and its close has not been reported yet.
    #[error("previous socket is still closing")]
    SocketClosing,

    /// The credential store had no token.
    #[error("no bearer token available")]
    MissingCredential,
}

/// Invalid client configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Endpoint is not a URL.
    #[error("invalid endpoint: {reason}")]
    InvalidEndpoint {
        /// Parser error message.
        reason: String,
    },

    /// Endpoint scheme is neither `ws` nor `wss`.
    #[error("unsupported endpoint scheme '{scheme}', expected ws or wss")]
    UnsupportedScheme {
        /// Scheme that was supplied.
        scheme: String,
    },

    /// Endpoint cannot carry a path.
    #[error("endpoint cannot be used as a base URL")]
    CannotBeABase,

    /// Endpoint has no host.
    #[error("endpoint has no host")]
    MissingHost,
}
