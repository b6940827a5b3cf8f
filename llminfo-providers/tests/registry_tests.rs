//! Integration tests for registry loading, staging, and committing.

use llminfo_core::{DefinitionRecord, ErrorKind, ParserKind, ProviderError};
use llminfo_fetch::StaticCredentials;
use llminfo_providers::{Origin, ProviderRegistry};
use std::sync::Arc;

fn candidate(name: &str, base_url: &str) -> DefinitionRecord {
    DefinitionRecord {
        name: Some(name.to_string()),
        base_url: Some(base_url.to_string()),
        api_key_env: Some("CUSTOM_API_KEY".to_string()),
        models_endpoint: Some("/models".to_string()),
        credits_endpoint: None,
        parser: Some("openai_compatible".to_string()),
        cache_ttl_secs: None,
    }
}

// ============================================================================
// Loading
// ============================================================================

#[tokio::test]
async fn test_load_with_missing_user_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");

    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();
    assert_eq!(registry.list(), ["openrouter", "groq", "cerebras", "openai"]);
    assert_eq!(registry.user_source(), Some(path.as_path()));
}

#[tokio::test]
async fn test_user_file_override_has_no_field_leak() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");
    tokio::fs::write(
        &path,
        r"
providers:
  openrouter:
    base_url: https://gateway.example.com
    api_key_env: GATEWAY_KEY
    models_endpoint: models
    parser: openai_compatible
",
    )
    .await
    .unwrap();

    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();
    let openrouter = registry.definition("openrouter").unwrap();

    assert_eq!(registry.list()[0], "openrouter");
    assert_eq!(registry.origin("openrouter"), Some(Origin::User));
    assert_eq!(openrouter.base_url, "https://gateway.example.com");
    assert_eq!(openrouter.models_endpoint, "/models");
    assert_eq!(openrouter.parser, ParserKind::OpenAiCompatible);
    // The built-in credits endpoint must not survive the override
    assert_eq!(openrouter.credits_endpoint, None);
    assert!(!openrouter.supports_credits());
}

// ============================================================================
// Stage
// ============================================================================

#[tokio::test]
async fn test_stage_unreachable_fails_without_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");
    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();

    let report = registry
        .stage(candidate("custom", "https://127.0.0.1:1"), Some("sk-test"))
        .await;

    assert!(!report.passed());
    assert_eq!(report.provider, "custom");
    assert_eq!(report.model_count(), 0);
    assert!(report.sample_ids(3).is_empty());
    assert_eq!(report.error().map(ProviderError::kind), Some(ErrorKind::Network));

    assert!(!path.exists());
    assert!(!registry.contains("custom"));
}

#[tokio::test]
async fn test_stage_invalid_candidate() {
    let registry = ProviderRegistry::builtin().unwrap();

    let report = registry
        .stage(candidate("custom", "http://llm.example.com"), Some("sk-test"))
        .await;

    assert!(!report.passed());
    assert_eq!(report.base_url, "http://llm.example.com");
    assert!(matches!(
        report.error(),
        Some(ProviderError::Config { field, .. }) if field == "base_url"
    ));
}

#[tokio::test]
async fn test_stage_without_key() {
    let registry = ProviderRegistry::builtin()
        .unwrap()
        .with_credentials(Arc::new(StaticCredentials::new()));

    let report = registry
        .stage(candidate("custom", "https://llm.example.com"), None)
        .await;

    assert_eq!(
        report.error().map(ProviderError::kind),
        Some(ErrorKind::MissingCredential)
    );
}

// ============================================================================
// Commit
// ============================================================================

#[tokio::test]
async fn test_commit_then_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");
    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();

    let committed = registry
        .commit(candidate("custom", "https://llm.example.com/v1/"))
        .await
        .unwrap();
    assert_eq!(committed.base_url, "https://llm.example.com/v1");

    // In-memory registry is unchanged until reloaded
    assert!(!registry.contains("custom"));

    let reloaded = ProviderRegistry::load_with_user_file(&path).await.unwrap();
    assert_eq!(reloaded.list().last(), Some(&"custom"));
    assert_eq!(reloaded.origin("custom"), Some(Origin::User));
    assert_eq!(reloaded.definition("custom"), Some(&committed));
}

#[tokio::test]
async fn test_commit_duplicate_user_provider() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");
    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();

    registry
        .commit(candidate("custom", "https://llm.example.com"))
        .await
        .unwrap();
    let before = tokio::fs::read_to_string(&path).await.unwrap();

    let err = registry
        .commit(candidate("custom", "https://other.example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);

    let after = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_commit_may_shadow_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");
    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();

    registry
        .commit(candidate("groq", "https://groq-proxy.example.com"))
        .await
        .unwrap();

    let reloaded = ProviderRegistry::load_with_user_file(&path).await.unwrap();
    assert_eq!(reloaded.list()[1], "groq");
    assert_eq!(reloaded.origin("groq"), Some(Origin::User));
    assert_eq!(
        reloaded.definition("groq").unwrap().base_url,
        "https://groq-proxy.example.com"
    );
}

#[tokio::test]
async fn test_commit_rejects_invalid_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("providers.yml");
    let registry = ProviderRegistry::load_with_user_file(&path).await.unwrap();

    let mut bad = candidate("custom", "https://llm.example.com");
    bad.parser = Some("soap".to_string());

    let err = registry.commit(bad).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_commit_without_user_source() {
    let registry = ProviderRegistry::builtin().unwrap();
    let err = registry
        .commit(candidate("custom", "https://llm.example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Storage { .. }));
}
