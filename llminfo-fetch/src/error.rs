//! Fetch error types.

use llminfo_core::ProviderError;
use std::time::Duration;
use thiserror::Error;

/// Longest body snippet kept in a [`FetchError::Status`].
pub const MAX_BODY_SNIPPET: usize = 200;

// ============================================================================
// Fetch Error
// ============================================================================

/// Error type for a single HTTP call.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// HTTP 401.
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 429.
    #[error("rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds from the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Transport failure (DNS, refused connection, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A 2xx body that is not JSON.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// Attaches a provider name, producing the engine-level error.
    pub fn into_provider_error(self, provider: &str) -> ProviderError {
        let provider = provider.to_string();
        match self {
            Self::Unauthorized => ProviderError::Auth { provider },
            Self::RateLimited { retry_after } => ProviderError::RateLimit {
                provider,
                retry_after,
            },
            Self::Status { status, body } => ProviderError::Upstream {
                provider,
                status,
                message: body,
            },
            Self::Network(message) | Self::Client(message) => {
                ProviderError::Network { provider, message }
            }
            Self::Timeout(after) => ProviderError::Timeout { provider, after },
            Self::InvalidBody(message) => ProviderError::MalformedResponse { provider, message },
        }
    }
}

/// Truncates a response body to at most [`MAX_BODY_SNIPPET`] characters.
pub fn body_snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_SNIPPET) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
