//! API key lookup.
//!
//! Keys are only ever read from environment variables. The lookup sits
//! behind [`CredentialSource`] so tests can supply keys without touching the
//! process environment.

use std::collections::HashMap;

/// Source of API keys, looked up by environment variable name.
pub trait CredentialSource: Send + Sync {
    /// Returns the value of `var`, or `None` when unset or empty.
    fn lookup(&self, var: &str) -> Option<String>;
}

/// Reads keys from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, var: &str) -> Option<String> {
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Fixed set of keys.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key.
    pub fn with(mut self, var: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(var.into(), value.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn lookup(&self, var: &str) -> Option<String> {
        self.values
            .get(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
