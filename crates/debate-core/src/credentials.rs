//! Bearer token sources.
//!
//! The client reads the token at every connect attempt, so a store that
//! refreshes its token between attempts is picked up without rebuilding the
//! client. An empty token counts as no token.

/// Supplies the bearer token for the session URI.
pub trait CredentialStore: Send + Sync {
    /// Current token, or `None` if the user is not signed in.
    fn bearer_token(&self) -> Option<String>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    fn bearer_token(&self) -> Option<String> {
        (**self).bearer_token()
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    fn bearer_token(&self) -> Option<String> {
        (**self).bearer_token()
    }
}

/// A fixed token.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    /// Always return `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Never return a token.
    #[must_use]
    pub fn missing() -> Self {
        Self(None)
    }
}

impl CredentialStore for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.is_empty())
    }
}

/// Reads the token from an environment variable at each call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    /// Default variable name.
    pub const DEFAULT_VAR: &'static str = "DEBATE_ACCESS_TOKEN";

    /// Read from `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Variable this store reads.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl CredentialStore for EnvToken {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.is_empty())
    }
}
