//! Integration tests for canonical records and definitions.

use llminfo_core::{
    CreditRecord, DefinitionRecord, ModelRecord, ProviderDefinition, select_best_free_model,
};

#[test]
fn test_remaining_never_clamped() {
    let mut total = 0.0_f64;
    while total <= 20.0 {
        let mut usage = 0.0_f64;
        while usage <= 30.0 {
            let credits = CreditRecord::new(total, usage);
            assert_eq!(credits.remaining(), total - usage);
            usage += 2.5;
        }
        total += 5.0;
    }
}

#[test]
fn test_cached_models_recompute_free_flag() {
    let cached = serde_json::json!([
        {"id": "m:free", "name": "m:free", "context_length": 131072, "is_free": false},
        {"id": "paid", "name": "Paid", "is_free": true},
    ]);

    let models: Vec<ModelRecord> = serde_json::from_value(cached).unwrap();
    assert!(models[0].is_free());
    assert!(!models[1].is_free());
    assert_eq!(select_best_free_model(&models).map(|m| m.id.as_str()), Some("m:free"));
}

#[test]
fn test_definition_validation_is_all_or_nothing() {
    let record = DefinitionRecord {
        name: Some("custom".to_string()),
        base_url: Some("https://llm.example.com/v1".to_string()),
        api_key_env: Some("CUSTOM_API_KEY".to_string()),
        models_endpoint: Some("/models".to_string()),
        credits_endpoint: None,
        parser: Some("nonexistent".to_string()),
        cache_ttl_secs: None,
    };

    let result: Result<ProviderDefinition, _> = record.validate(Some("custom"));
    let err = result.unwrap_err();
    assert_eq!(err.provider(), "custom");
    assert!(err.to_string().contains("parser"));
}
