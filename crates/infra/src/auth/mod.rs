//! Bearer token sources

use consentflow_core::TokenSource;
use consentflow_domain::constants::ARM_TOKEN_ENV;

/// Reads the ARM token from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    /// Read from `CONSENTFLOW_ARM_TOKEN`.
    pub fn new() -> Self {
        Self::with_var(ARM_TOKEN_ENV)
    }

    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for EnvTokenSource {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }
}

/// Fixed token, mainly for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource {
    token: Option<String>,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }

    /// A source with no signed-in session.
    pub fn empty() -> Self {
        Self { token: None }
    }
}

impl TokenSource for StaticTokenSource {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}
