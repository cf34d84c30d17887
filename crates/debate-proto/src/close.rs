//! WebSocket close codes.
//!
//! Only the distinction between a normal close and everything else matters to
//! the client: a normal close is terminal, any other code is eligible for
//! reconnection.

use std::fmt;

/// Close status code reported for a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(u16);

impl CloseCode {
    /// Normal closure (1000). Used for intentional disconnects.
    pub const NORMAL: Self = Self(1000);
    /// Endpoint going away (1001).
    pub const GOING_AWAY: Self = Self(1001);
    /// Protocol error (1002).
    pub const PROTOCOL_ERROR: Self = Self(1002);
    /// Close frame carried no status code (1005).
    pub const NO_STATUS: Self = Self(1005);
    /// Connection dropped without a close frame (1006).
    pub const ABNORMAL: Self = Self(1006);
    /// Server terminated on an internal error (1011).
    pub const INTERNAL_ERROR: Self = Self(1011);

    /// Wrap a raw status code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Raw status code.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Whether this close ends the session for good.
    #[must_use]
    pub const fn is_normal(self) -> bool {
        self.0 == Self::NORMAL.0
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_1000_is_normal() {
        assert!(CloseCode::NORMAL.is_normal());
        assert!(!CloseCode::ABNORMAL.is_normal());
        assert!(!CloseCode::GOING_AWAY.is_normal());
        assert!(!CloseCode::new(4000).is_normal());
    }
}
