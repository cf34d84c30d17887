//! Session identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Identifier of one debate session.
///
/// Opaque positive integer assigned by the backend. A client is bound to one
/// session for its whole lifetime; a different session needs a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw identifier.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidSessionId` if `raw` is zero
    pub fn new(raw: u64) -> Result<Self, ProtocolError> {
        if raw == 0 {
            return Err(ProtocolError::InvalidSessionId(raw));
        }
        Ok(Self(raw))
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for SessionId {
    type Error = ProtocolError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<SessionId> for u64 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(SessionId::new(0), Err(ProtocolError::InvalidSessionId(0)));
        assert_eq!(SessionId::new(42).map(SessionId::get), Ok(42));
    }

    #[test]
    fn deserialize_rejects_zero() {
        assert!(serde_json::from_str::<SessionId>("0").is_err());
        assert_eq!(serde_json::from_str::<SessionId>("7").ok().map(SessionId::get), Some(7));
    }
}
