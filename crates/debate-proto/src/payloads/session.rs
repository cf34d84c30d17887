//! Session handshake payloads.

use serde::{Deserialize, Serialize};

/// Greeting the server sends right after accepting the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEstablished {
    /// Human readable greeting.
    pub message: String,
    /// Authenticated user's id.
    pub user_id: u64,
    /// Authenticated user's display name.
    pub username: String,
}
