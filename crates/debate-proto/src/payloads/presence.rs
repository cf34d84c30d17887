//! Presence payloads: participant roster and typing set.

use serde::{Deserialize, Serialize};

/// A session participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// User id.
    pub id: u64,
    /// Display name.
    pub username: String,
    /// Online flag, when the backend tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_online: Option<bool>,
}

/// Body of `user_joined` and `user_left`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChange {
    /// The joining or leaving user's id. Not every backend sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// The joining or leaving user's display name.
    pub username: String,
    /// Full roster after the change. Replaces the local roster when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Participant>>,
}

/// A user currently typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingUser {
    /// User id.
    pub user_id: u64,
    /// Display name.
    pub username: String,
}

/// Body of `typing_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingStatus {
    /// Everyone typing right now. Replaces the local set when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typing_users: Option<Vec<TypingUser>>,
}
