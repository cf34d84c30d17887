//! Client configuration.

use std::{fmt, str::FromStr, time::Duration};

use debate_proto::SessionId;
use url::{Url, form_urlencoded};

use crate::error::ConfigError;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8001";

/// Reconnect attempts made after abnormal closes before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Delay before each reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Window inside which a repeated chat message is shown once.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(2);

/// Validated realtime endpoint (`ws://host[:port][/prefix]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: String,
}

impl Endpoint {
    /// Parse and validate an endpoint.
    ///
    /// Query and fragment are discarded, and a trailing slash is trimmed.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut url =
            Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint { reason: e.to_string() })?;

        match url.scheme() {
            "ws" | "wss" => {},
            other => return Err(ConfigError::UnsupportedScheme { scheme: other.to_owned() }),
        }
        if url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase);
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingHost);
        }

        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { base: url.as_str().trim_end_matches('/').to_owned() })
    }

    /// Endpoint without trailing slash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Whether the endpoint uses TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base.starts_with("wss:")
    }

    /// Full socket URI for `session`, authenticated with `token`.
    #[must_use]
    pub fn session_uri(&self, session: SessionId, token: &str) -> String {
        let token: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
        format!("{}/ws/debate/{session}/?token={token}", self.base)
    }

    /// Socket URI for `session` with the token hidden, for logs.
    #[must_use]
    pub fn redacted_uri(&self, session: SessionId) -> String {
        format!("{}/ws/debate/{session}/?token=<redacted>", self.base)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self { base: DEFAULT_ENDPOINT.to_owned() }
    }
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Delay growth between reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Every attempt waits the base delay.
    #[default]
    Fixed,
    /// Attempt `n` waits `base * 2^(n-1)`, never more than `max_delay`.
    Exponential {
        /// Upper bound on any single delay.
        max_delay: Duration,
    },
}

/// Session client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Realtime endpoint.
    pub endpoint: Endpoint,
    /// Retries after abnormal closes before giving up. Zero disables retry.
    pub max_reconnect_attempts: u32,
    /// Base delay before a retry.
    pub reconnect_delay: Duration,
    /// How the delay grows between attempts.
    pub backoff: Backoff,
    /// Duplicate suppression window for the message log. Zero disables it.
    pub dedup_window: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            backoff: Backoff::Fixed,
            dedup_window: DEFAULT_DEDUP_WINDOW,
        }
    }
}
