//! HTTP client for provider APIs.
//!
//! Wraps `reqwest` with bearer authentication, a fixed per-call timeout,
//! request tracing, and the status classification every provider shares.
//! There is no retry: each call is attempted exactly once.

use reqwest::{Client, Response, header};
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{FetchError, body_snippet};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent string for llminfo.
const USER_AGENT: &str = concat!("llminfo/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and typed failures.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client with the default 30s timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom per-call timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { inner, timeout })
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs an authenticated GET and decodes the body as JSON.
    ///
    /// Non-2xx statuses are classified with [`classify_status`]; a 2xx body
    /// that is not JSON is [`FetchError::InvalidBody`].
    #[instrument(skip(self, api_key), fields(url = %url))]
    pub async fn get_json(&self, url: &str, api_key: &str) -> Result<Value, FetchError> {
        debug!("GET request with auth");

        let response = self
            .inner
            .get(url)
            .bearer_auth(api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        debug!(status = %status, "Response received");

        if !status.is_success() {
            let retry_after = response.retry_after_secs();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), retry_after, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "Body is not JSON");
            FetchError::InvalidBody(format!("{e} (body: {})", body_snippet(&body)))
        })
    }

    /// Returns the inner reqwest client for advanced operations.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    fn transport_error(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(error_chain(err))
        }
    }
}

/// Maps a non-success status to its typed error.
pub fn classify_status(status: u16, retry_after: Option<u64>, body: &str) -> FetchError {
    match status {
        401 => FetchError::Unauthorized,
        429 => FetchError::RateLimited { retry_after },
        _ => FetchError::Status {
            status,
            body: body_snippet(body),
        },
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubResponse, StubServer};

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(401, None, ""), FetchError::Unauthorized));
        assert!(matches!(
            classify_status(429, Some(7), ""),
            FetchError::RateLimited { retry_after: Some(7) }
        ));
        assert!(matches!(
            classify_status(403, None, "forbidden"),
            FetchError::Status { status: 403, ref body } if body == "forbidden"
        ));
        assert!(matches!(
            classify_status(503, None, ""),
            FetchError::Status { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_and_accept() {
        let server = StubServer::start(vec![(
            "/models",
            StubResponse::json(200, r#"{"data": []}"#),
        )])
        .await;

        let client = HttpClient::new().unwrap();
        let body = client
            .get_json(&server.url("/models"), "sk-test")
            .await
            .unwrap();
        assert_eq!(body["data"], serde_json::json!([]));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let head = requests[0].to_ascii_lowercase();
        assert!(head.starts_with("get /models "));
        assert!(head.contains("authorization: bearer sk-test"));
        assert!(head.contains("accept: application/json"));
        assert!(head.contains("user-agent: llminfo/"));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = StubServer::start(vec![(
            "/models",
            StubResponse::json(429, "{}").with_header("Retry-After", "42"),
        )])
        .await;

        let err = HttpClient::new()
            .unwrap()
            .get_json(&server.url("/models"), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { retry_after: Some(42) }));
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid() {
        let server = StubServer::start(vec![(
            "/models",
            StubResponse::text(200, "<html>maintenance</html>"),
        )])
        .await;

        let err = HttpClient::new()
            .unwrap()
            .get_json(&server.url("/models"), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = StubServer::start(vec![(
            "/models",
            StubResponse::json(200, "{}").with_delay(Duration::from_secs(5)),
        )])
        .await;

        let client = HttpClient::with_timeout(Duration::from_millis(200)).unwrap();
        let err = client
            .get_json(&server.url("/models"), "k")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(t) if t == Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let url = StubServer::unreachable_url("/models").await;
        let err = HttpClient::new()
            .unwrap()
            .get_json(&url, "k")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    }
}
