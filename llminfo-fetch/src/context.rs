//! Fetch settings.

use std::time::Duration;

use crate::error::FetchError;
use crate::host::http::{DEFAULT_TIMEOUT, HttpClient};

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Per-call request timeout.
    pub request_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchSettings {
    /// Creates settings with a custom request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds an HTTP client honoring these settings.
    pub fn http_client(&self) -> Result<HttpClient, FetchError> {
        HttpClient::with_timeout(self.request_timeout)
    }
}
