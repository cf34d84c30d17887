//! Chat message and reaction payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A broadcast chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author's user id.
    pub user_id: u64,
    /// Author's display name.
    pub username: String,
    /// Message text.
    pub message: String,
    /// Sender-supplied timestamp. The backend echoes it verbatim, so it may be
    /// null.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Emoji to reaction count, when the backend aggregates reactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji_reactions: Option<BTreeMap<String, u32>>,
    /// Attached image, for `message_with_image` broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ChatMessage {
    /// Whether two messages carry the same author, content and timestamp.
    ///
    /// Reaction counts are ignored: a re-broadcast with updated counts is the
    /// same message.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.user_id == other.user_id
            && self.username == other.username
            && self.message == other.message
            && self.image_url == other.image_url
            && self.timestamp == other.timestamp
    }
}

/// An emoji reaction to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Message the reaction targets.
    pub message_id: u64,
    /// Reaction emoji.
    pub emoji: String,
    /// Reacting user, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Reacting user's display name, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}
