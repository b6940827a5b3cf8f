//! Error taxonomy for provider resolution, fetching, and persistence.
//!
//! Every failure names the provider it concerns so it can be rendered as a
//! one-line diagnostic.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or invalid provider definition.
    Config,
    /// Unknown provider name.
    NotFound,
    /// Required environment variable unset.
    MissingCredential,
    /// HTTP 401.
    Auth,
    /// HTTP 429.
    RateLimit,
    /// Any other non-2xx status.
    Upstream,
    /// Transport failure.
    Network,
    /// Payload shape violates parser expectations.
    MalformedResponse,
    /// Per-call or overall deadline exceeded.
    Timeout,
    /// Commit name collision.
    Duplicate,
    /// Reading or writing the user definition source failed.
    Storage,
}

impl ErrorKind {
    /// Returns the stable identifier for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::NotFound => "not_found",
            Self::MissingCredential => "missing_credential",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Upstream => "upstream",
            Self::Network => "network",
            Self::MalformedResponse => "malformed_response",
            Self::Timeout => "timeout",
            Self::Duplicate => "duplicate",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Provider Error
// ============================================================================

/// Error type for everything the engine can report about a provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Invalid provider definition.
    #[error("{provider}: invalid `{field}`: {message}")]
    Config {
        /// Provider the definition belongs to.
        provider: String,
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// No provider registered under this name.
    #[error("{0}: unknown provider")]
    NotFound(String),

    /// The API key environment variable is unset or empty.
    #[error("{provider}: environment variable {env_var} is not set")]
    MissingCredential {
        /// Provider name.
        provider: String,
        /// Name of the environment variable.
        env_var: String,
    },

    /// Upstream rejected the credentials.
    #[error("{provider}: authentication failed (HTTP 401)")]
    Auth {
        /// Provider name.
        provider: String,
    },

    /// Upstream rate limited the request.
    #[error("{provider}: rate limited (HTTP 429){}", retry_hint(.retry_after))]
    RateLimit {
        /// Provider name.
        provider: String,
        /// Seconds from the `Retry-After` header, if sent.
        retry_after: Option<u64>,
    },

    /// Any other non-success status.
    #[error("{provider}: upstream returned HTTP {status}: {message}")]
    Upstream {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body snippet.
        message: String,
    },

    /// Connection could not be established or was interrupted.
    #[error("{provider}: network error: {message}")]
    Network {
        /// Provider name.
        provider: String,
        /// Transport error message.
        message: String,
    },

    /// Response body does not have the shape the parser expects.
    #[error("{provider}: malformed response: {message}")]
    MalformedResponse {
        /// Provider name.
        provider: String,
        /// What was wrong with the payload.
        message: String,
    },

    /// A deadline elapsed before the provider answered.
    #[error("{provider}: timed out after {}s", .after.as_secs_f64())]
    Timeout {
        /// Provider name.
        provider: String,
        /// The deadline that was exceeded.
        after: Duration,
    },

    /// A user-defined provider with this name already exists.
    #[error("{0}: a user-defined provider with this name already exists")]
    Duplicate(String),

    /// The user definition source could not be read or written.
    #[error("{provider}: storage error: {message}")]
    Storage {
        /// Provider name.
        provider: String,
        /// I/O or serialization message.
        message: String,
    },
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after
        .map(|secs| format!(", retry after {secs}s"))
        .unwrap_or_default()
}

impl ProviderError {
    /// Creates a configuration error.
    pub fn config(
        provider: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Config {
            provider: provider.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::MissingCredential { .. } => ErrorKind::MissingCredential,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Upstream { .. } => ErrorKind::Upstream,
            Self::Network { .. } => ErrorKind::Network,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Returns the provider this error concerns.
    pub fn provider(&self) -> &str {
        match self {
            Self::NotFound(provider) | Self::Duplicate(provider) => provider,
            Self::Config { provider, .. }
            | Self::MissingCredential { provider, .. }
            | Self::Auth { provider }
            | Self::RateLimit { provider, .. }
            | Self::Upstream { provider, .. }
            | Self::Network { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Storage { provider, .. } => provider,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::RateLimit { .. } => Some(429),
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if a later attempt could succeed without a config change.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimit | ErrorKind::Network | ErrorKind::Timeout
        ) || self.status().is_some_and(|s| s >= 500)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_line_with_provider() {
        let errors = [
            ProviderError::config("groq", "base_url", "must use https"),
            ProviderError::NotFound("nope".to_string()),
            ProviderError::Auth {
                provider: "openrouter".to_string(),
            },
            ProviderError::Upstream {
                provider: "groq".to_string(),
                status: 503,
                message: "unavailable".to_string(),
            },
            ProviderError::Timeout {
                provider: "groq".to_string(),
                after: Duration::from_millis(1500),
            },
        ];

        for err in errors {
            let line = err.to_string();
            assert!(!line.contains('\n'), "multi-line: {line}");
            assert!(line.starts_with(err.provider()), "no provider: {line}");
        }
    }

    #[test]
    fn test_rate_limit_retry_hint() {
        let with_hint = ProviderError::RateLimit {
            provider: "p".to_string(),
            retry_after: Some(12),
        };
        assert_eq!(with_hint.to_string(), "p: rate limited (HTTP 429), retry after 12s");

        let without = ProviderError::RateLimit {
            provider: "p".to_string(),
            retry_after: None,
        };
        assert_eq!(without.to_string(), "p: rate limited (HTTP 429)");
    }

    #[test]
    fn test_kind_and_status() {
        let auth = ProviderError::Auth {
            provider: "p".to_string(),
        };
        assert_eq!(auth.kind(), ErrorKind::Auth);
        assert_eq!(auth.status(), Some(401));

        let dup = ProviderError::Duplicate("mine".to_string());
        assert_eq!(dup.kind().as_str(), "duplicate");
        assert_eq!(dup.status(), None);
    }

    #[test]
    fn test_transient_classification() {
        let server = ProviderError::Upstream {
            provider: "p".to_string(),
            status: 502,
            message: String::new(),
        };
        assert!(server.is_transient());

        let not_found = ProviderError::Upstream {
            provider: "p".to_string(),
            status: 404,
            message: String::new(),
        };
        assert!(!not_found.is_transient());
        assert!(!ProviderError::NotFound("p".to_string()).is_transient());
    }
}
