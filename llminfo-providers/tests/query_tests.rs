//! Integration tests for the query engine.

use async_trait::async_trait;
use llminfo_core::{
    CreditRecord, ErrorKind, ModelRecord, ParserKind, ProviderDefinition, ProviderError,
};
use llminfo_fetch::testing::{StubResponse, StubServer};
use llminfo_fetch::{HttpClient, ProviderCapability, StaticCredentials};
use llminfo_providers::{GenericProvider, ProviderRegistry, QueryEngine, QueryOptions, Source};
use llminfo_store::{CacheKey, CacheStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ============================================================================
// Mock Capability
// ============================================================================

struct MockProvider {
    name: &'static str,
    delay: Option<Duration>,
    credits: Option<CreditRecord>,
    calls: AtomicUsize,
}

impl MockProvider {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            delay: None,
            credits: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with_credits(mut self, total: f64, usage: f64) -> Self {
        self.credits = Some(CreditRecord::new(total, usage));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderCapability for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch_models(&self) -> Result<Vec<ModelRecord>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(vec![ModelRecord::from_id(format!("{}-call-{call}", self.name))])
    }

    async fn fetch_credits(&self) -> Result<Option<CreditRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.credits)
    }

    fn supports_credits(&self) -> bool {
        self.credits.is_some()
    }
}

fn empty_registry() -> ProviderRegistry {
    ProviderRegistry::load("", "").unwrap()
}

fn stub_provider(name: &str, base_url: &str) -> Arc<GenericProvider> {
    let definition = ProviderDefinition {
        name: name.to_string(),
        base_url: base_url.to_string(),
        api_key_env: "STUB_API_KEY".to_string(),
        models_endpoint: "/models".to_string(),
        credits_endpoint: None,
        parser: ParserKind::OpenAiCompatible,
        cache_ttl_secs: None,
    };
    let http = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
    Arc::new(GenericProvider::new(definition, "sk-test", Arc::new(http)))
}

// ============================================================================
// Batch Queries
// ============================================================================

#[tokio::test]
async fn test_partial_failure_in_registry_order() {
    let denied = StubServer::start(vec![(
        "/models",
        StubResponse::json(401, r#"{"error": "invalid key"}"#),
    )])
    .await;
    let healthy = StubServer::start(vec![(
        "/models",
        StubResponse::json(200, r#"{"data": [{"id": "m:free", "context_length": 131072}]}"#),
    )])
    .await;
    let unreachable = StubServer::unreachable_url("").await;

    let mut registry = empty_registry();
    registry.register_capability(stub_provider("alpha", &denied.base_url()));
    registry.register_capability(stub_provider("beta", &unreachable));
    registry.register_capability(stub_provider("gamma", &healthy.base_url()));

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let results = QueryEngine::new(&registry, &cache).query_all_models().await;

    let names: Vec<&str> = results.iter().map(|r| r.provider.as_str()).collect();
    assert_eq!(names, ["alpha", "beta", "gamma"]);

    assert_eq!(results[0].error().map(ProviderError::kind), Some(ErrorKind::Auth));
    assert_eq!(results[1].error().map(ProviderError::kind), Some(ErrorKind::Network));

    let models = results[2].value().unwrap();
    assert_eq!(models.len(), 1);
    assert!(models[0].is_free());
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    // Only the success is cached
    assert!(cache.get(&CacheKey::models("gamma"), Duration::from_secs(60)).await.is_some());
    assert!(cache.get(&CacheKey::models("alpha"), Duration::from_secs(60)).await.is_none());
}

#[tokio::test]
async fn test_missing_credentials_fail_per_provider() {
    let registry = ProviderRegistry::builtin()
        .unwrap()
        .with_credentials(Arc::new(StaticCredentials::new()));
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());

    let results = QueryEngine::new(&registry, &cache).query_all_models().await;

    assert_eq!(results.len(), 4);
    for result in &results {
        assert_eq!(
            result.error().map(ProviderError::kind),
            Some(ErrorKind::MissingCredential),
            "{}",
            result.provider
        );
    }
}

#[tokio::test]
async fn test_unknown_name_in_batch_is_per_provider() {
    let mut registry = empty_registry();
    registry.register_capability(Arc::new(MockProvider::new("known")));
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());

    let results = QueryEngine::new(&registry, &cache)
        .query_models(&["known", "ghost"])
        .await;

    assert!(results[0].is_ok());
    assert_eq!(results[1].error().map(ProviderError::kind), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn test_overall_timeout_keeps_completed_results() {
    let slow = Arc::new(MockProvider::new("slow").with_delay(Duration::from_secs(30)));
    let fast = Arc::new(MockProvider::new("fast"));

    let mut registry = empty_registry();
    registry.register_capability(slow.clone());
    registry.register_capability(fast.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let options = QueryOptions::default().overall_timeout(Some(Duration::from_millis(200)));

    let results = QueryEngine::new(&registry, &cache)
        .with_options(options)
        .query_all_models()
        .await;

    assert_eq!(results[0].provider, "slow");
    assert!(matches!(
        results[0].error(),
        Some(ProviderError::Timeout { provider, after })
            if provider == "slow" && *after == Duration::from_millis(200)
    ));
    assert!(results[1].is_ok());
    assert!(cache.get(&CacheKey::models("slow"), Duration::from_secs(60)).await.is_none());
}

// ============================================================================
// Cache Policy
// ============================================================================

#[tokio::test]
async fn test_second_query_is_served_from_cache() {
    let mock = Arc::new(MockProvider::new("mock"));
    let mut registry = empty_registry();
    registry.register_capability(mock.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let engine = QueryEngine::new(&registry, &cache);

    let first = engine.models_for("mock").await.unwrap();
    let second = engine.models_for("mock").await.unwrap();

    assert_eq!(first.source, Source::Network);
    assert_eq!(second.source, Source::Cache);
    assert_eq!(first.value, second.value);
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_force_refresh_overwrites_fresh_entry() {
    let mock = Arc::new(MockProvider::new("mock"));
    let mut registry = empty_registry();
    registry.register_capability(mock.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let key = CacheKey::models("mock");
    cache
        .put(&key, &vec![ModelRecord::from_id("stale-but-fresh")])
        .await
        .unwrap();

    let engine = QueryEngine::new(&registry, &cache)
        .with_options(QueryOptions::default().force_refresh(true));
    let fetched = engine.models_for("mock").await.unwrap();

    assert_eq!(fetched.source, Source::Network);
    assert_eq!(fetched.value[0].id, "mock-call-1");
    assert_eq!(mock.calls(), 1);

    let entry = cache.get(&key, Duration::from_secs(60)).await.unwrap();
    let cached: Vec<ModelRecord> = entry.decode().unwrap();
    assert_eq!(cached, fetched.value);
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_refetched() {
    let mock = Arc::new(MockProvider::new("mock"));
    let mut registry = empty_registry();
    registry.register_capability(mock.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let key = CacheKey::models("mock");

    // Valid entry whose payload is not a model list
    cache.put(&key, "not a model list").await.unwrap();
    let fetched = QueryEngine::new(&registry, &cache).models_for("mock").await.unwrap();
    assert_eq!(fetched.source, Source::Network);

    // Unreadable file
    tokio::fs::write(cache.path_for(&key), b"{truncated").await.unwrap();
    let fetched = QueryEngine::new(&registry, &cache).models_for("mock").await.unwrap();
    assert_eq!(fetched.source, Source::Network);
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_models_for_unknown_is_hard_error() {
    let registry = empty_registry();
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());

    let err = QueryEngine::new(&registry, &cache)
        .models_for("ghost")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ============================================================================
// Credits
// ============================================================================

#[tokio::test]
async fn test_credits_cached_like_models() {
    let mock = Arc::new(MockProvider::new("paid").with_credits(10.0, 12.5));
    let mut registry = empty_registry();
    registry.register_capability(mock.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());
    let engine = QueryEngine::new(&registry, &cache);

    let first = engine.credits_for("paid").await.unwrap();
    let second = engine.credits_for("paid").await.unwrap();

    assert_eq!(first.source, Source::Network);
    assert_eq!(second.source, Source::Cache);
    assert_eq!(second.value.map(|c| c.remaining()), Some(-2.5));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_credits_unsupported_makes_no_call() {
    let mock = Arc::new(MockProvider::new("free"));
    let mut registry = empty_registry();
    registry.register_capability(mock.clone());

    let dir = tempfile::tempdir().unwrap();
    let cache = CacheStore::new(dir.path());

    let results = QueryEngine::new(&registry, &cache)
        .query_credits(&["free"])
        .await;

    assert_eq!(results[0].value(), Some(&None));
    let source = results[0].outcome.as_ref().ok().map(|f| f.source);
    assert_eq!(source, Some(Source::Unsupported));
    assert_eq!(mock.calls(), 0);
    assert!(!cache.path_for(&CacheKey::credits("free")).exists());
}
