//! Generic declarative provider.
//!
//! One [`GenericProvider`] serves every provider that a
//! [`ProviderDefinition`] plus a parser strategy can describe. The API key is
//! supplied at construction; no environment lookups happen per call.

use async_trait::async_trait;
use llminfo_core::{CreditRecord, ModelRecord, ProviderDefinition, ProviderError};
use llminfo_fetch::{HttpClient, ProviderCapability};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::parser::parser_for;

// ============================================================================
// Generic Provider
// ============================================================================

/// A provider driven entirely by its definition.
#[derive(Clone)]
pub struct GenericProvider {
    definition: ProviderDefinition,
    api_key: String,
    http: Arc<HttpClient>,
    default_ttl: Duration,
}

impl GenericProvider {
    /// Creates a provider from a validated definition and its API key.
    pub fn new(
        definition: ProviderDefinition,
        api_key: impl Into<String>,
        http: Arc<HttpClient>,
    ) -> Self {
        let default_ttl = definition.cache_ttl();
        Self {
            definition,
            api_key: api_key.into(),
            http,
            default_ttl,
        }
    }

    /// Sets the TTL used when the definition does not carry one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Returns the definition backing this provider.
    pub fn definition(&self) -> &ProviderDefinition {
        &self.definition
    }

    async fn get(&self, url: &str) -> Result<serde_json::Value, ProviderError> {
        self.http
            .get_json(url, &self.api_key)
            .await
            .map_err(|e| e.into_provider_error(&self.definition.name))
    }
}

impl fmt::Debug for GenericProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericProvider")
            .field("name", &self.definition.name)
            .field("base_url", &self.definition.base_url)
            .field("parser", &self.definition.parser)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderCapability for GenericProvider {
    fn name(&self) -> &str {
        &self.definition.name
    }

    #[instrument(skip(self), fields(provider = %self.definition.name))]
    async fn fetch_models(&self) -> Result<Vec<ModelRecord>, ProviderError> {
        let url = self.definition.models_url();
        let payload = self.get(&url).await?;

        let models = parser_for(self.definition.parser)
            .parse_models(&payload)
            .map_err(|e| e.into_provider_error(&self.definition.name))?;

        info!(count = models.len(), "Fetched models");
        Ok(models)
    }

    #[instrument(skip(self), fields(provider = %self.definition.name))]
    async fn fetch_credits(&self) -> Result<Option<CreditRecord>, ProviderError> {
        let Some(url) = self.definition.credits_url() else {
            debug!("No credits endpoint");
            return Ok(None);
        };

        let payload = self.get(&url).await?;
        parser_for(self.definition.parser)
            .parse_credits(&payload)
            .map_err(|e| e.into_provider_error(&self.definition.name))
    }

    fn supports_credits(&self) -> bool {
        self.definition.supports_credits()
    }

    fn cache_ttl(&self) -> Duration {
        self.definition
            .cache_ttl_secs
            .map_or(self.default_ttl, Duration::from_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use llminfo_core::{ErrorKind, ParserKind};
    use llminfo_fetch::testing::{StubResponse, StubServer};

    fn definition(base_url: &str, parser: ParserKind, credits: Option<&str>) -> ProviderDefinition {
        ProviderDefinition {
            name: "stub".to_string(),
            base_url: base_url.to_string(),
            api_key_env: "STUB_API_KEY".to_string(),
            models_endpoint: "/models".to_string(),
            credits_endpoint: credits.map(str::to_string),
            parser,
            cache_ttl_secs: None,
        }
    }

    fn client() -> Arc<HttpClient> {
        Arc::new(HttpClient::with_timeout(Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_models_dedupes() {
        let server = StubServer::start(vec![(
            "/models",
            StubResponse::json(
                200,
                r#"{"data": [{"id": "a"}, {"id": "b"}, {"id": "a"}, {"name": "no id"}, 7]}"#,
            ),
        )])
        .await;

        let provider = GenericProvider::new(
            definition(&server.base_url(), ParserKind::OpenAiCompatible, None),
            "k",
            client(),
        );
        let models = provider.fetch_models().await.unwrap();
        let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (401, ErrorKind::Auth),
            (429, ErrorKind::RateLimit),
            (403, ErrorKind::Upstream),
            (500, ErrorKind::Upstream),
        ];

        for (status, kind) in cases {
            let server =
                StubServer::start(vec![("/models", StubResponse::json(status, "{}"))]).await;
            let provider = GenericProvider::new(
                definition(&server.base_url(), ParserKind::OpenAiCompatible, None),
                "k",
                client(),
            );

            let err = provider.fetch_models().await.unwrap_err();
            assert_eq!(err.kind(), kind, "status {status}");
            assert_eq!(err.provider(), "stub");
            assert_eq!(err.status(), Some(status));
        }
    }

    #[tokio::test]
    async fn test_missing_data_key_is_malformed() {
        let server = StubServer::start(vec![(
            "/models",
            StubResponse::json(200, r#"{"models": []}"#),
        )])
        .await;
        let provider = GenericProvider::new(
            definition(&server.base_url(), ParserKind::OpenAiCompatible, None),
            "k",
            client(),
        );

        let err = provider.fetch_models().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_no_credits_endpoint_makes_no_call() {
        let server = StubServer::start(vec![]).await;
        let provider = GenericProvider::new(
            definition(&server.base_url(), ParserKind::OpenRouter, None),
            "k",
            client(),
        );

        assert!(!provider.supports_credits());
        assert_eq!(provider.fetch_credits().await.unwrap(), None);
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_credits() {
        let server = StubServer::start(vec![(
            "/credits",
            StubResponse::json(200, r#"{"data": {"total_credits": 10, "total_usage": 12.5}}"#),
        )])
        .await;
        let provider = GenericProvider::new(
            definition(&server.base_url(), ParserKind::OpenRouter, Some("/credits")),
            "k",
            client(),
        );

        let credits = provider.fetch_credits().await.unwrap().unwrap();
        assert_eq!(credits.remaining(), -2.5);
    }

    #[test]
    fn test_cache_ttl_prefers_definition() {
        let mut def = definition("https://x.example", ParserKind::OpenAiCompatible, None);
        let provider = GenericProvider::new(def.clone(), "k", client())
            .with_default_ttl(Duration::from_secs(120));
        assert_eq!(provider.cache_ttl(), Duration::from_secs(120));

        def.cache_ttl_secs = Some(30);
        let provider = GenericProvider::new(def, "k", client())
            .with_default_ttl(Duration::from_secs(120));
        assert_eq!(provider.cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let provider = GenericProvider::new(
            definition("https://x.example", ParserKind::OpenAiCompatible, None),
            "sk-secret",
            client(),
        );
        assert!(!format!("{provider:?}").contains("sk-secret"));
    }
}
