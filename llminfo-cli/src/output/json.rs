//! JSON output formatting.

use anyhow::Result;
use llminfo_core::{CreditRecord, ModelRecord, ProviderError};
use llminfo_providers::{
    Fetched, Origin, ProviderInfo, QueryResult, RejectedDefinition, Source, TestReport,
};
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Output Types
// ============================================================================

/// A typed failure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&ProviderError> for ErrorOutput {
    fn from(err: &ProviderError) -> Self {
        Self {
            kind: err.kind().as_str(),
            message: err.to_string(),
            status: err.status(),
        }
    }
}

/// Models of one provider, or why there are none.
#[derive(Debug, Serialize)]
pub struct ModelsOutput<'a> {
    pub provider: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<&'a ModelRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
}

/// Credit balance of one provider.
#[derive(Debug, Serialize)]
pub struct CreditsOutput<'a> {
    pub provider: &'a str,
    pub source: Source,
    /// `null` when the provider has no credits endpoint.
    pub credits: Option<&'a CreditRecord>,
}

/// Registry listing.
#[derive(Debug, Serialize)]
pub struct ProvidersOutput<'a> {
    pub providers: &'a [ProviderInfo],
    pub rejected: Vec<RejectedOutput<'a>>,
}

/// A definition dropped during load.
#[derive(Debug, Serialize)]
pub struct RejectedOutput<'a> {
    pub name: &'a str,
    pub origin: Origin,
    pub error: ErrorOutput,
}

/// Best free model.
#[derive(Debug, Serialize)]
pub struct BestFreeOutput<'a> {
    pub provider: &'a str,
    pub model: &'a ModelRecord,
}

/// Result of staging (and possibly committing) a candidate.
#[derive(Debug, Serialize)]
pub struct TestReportOutput<'a> {
    pub provider: &'a str,
    pub base_url: &'a str,
    pub passed: bool,
    pub model_count: usize,
    pub sample_ids: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_to: Option<String>,
}

/// Cache clearing result.
#[derive(Debug, Serialize)]
pub struct CacheClearOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'a str>,
    pub removed: usize,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }

    /// Formats model query results, one entry per provider.
    pub fn format_models(
        &self,
        results: &[QueryResult<Vec<ModelRecord>>],
        free_only: bool,
    ) -> Result<String> {
        let output: Vec<ModelsOutput<'_>> = results
            .iter()
            .map(|result| match &result.outcome {
                Ok(fetched) => ModelsOutput {
                    provider: &result.provider,
                    source: Some(fetched.source),
                    models: Some(
                        fetched
                            .value
                            .iter()
                            .filter(|m| !free_only || m.is_free())
                            .collect(),
                    ),
                    error: None,
                },
                Err(e) => ModelsOutput {
                    provider: &result.provider,
                    source: None,
                    models: None,
                    error: Some(e.into()),
                },
            })
            .collect();

        self.render(&output)
    }

    /// Formats a credit balance.
    pub fn format_credits(
        &self,
        provider: &str,
        fetched: &Fetched<Option<CreditRecord>>,
    ) -> Result<String> {
        self.render(&CreditsOutput {
            provider,
            source: fetched.source,
            credits: fetched.value.as_ref(),
        })
    }

    /// Formats the registry listing.
    pub fn format_providers(
        &self,
        providers: &[ProviderInfo],
        rejected: &[RejectedDefinition],
    ) -> Result<String> {
        self.render(&ProvidersOutput {
            providers,
            rejected: rejected
                .iter()
                .map(|r| RejectedOutput {
                    name: &r.name,
                    origin: r.origin,
                    error: (&r.error).into(),
                })
                .collect(),
        })
    }

    /// Formats the best free model, or `null`.
    pub fn format_best_free(&self, best: Option<(&str, &ModelRecord)>) -> Result<String> {
        let output = best.map(|(provider, model)| BestFreeOutput { provider, model });
        self.render(&output)
    }

    /// Formats a stage report.
    pub fn format_test_report(&self, report: &TestReport, added_to: Option<&Path>) -> Result<String> {
        self.render(&TestReportOutput {
            provider: &report.provider,
            base_url: &report.base_url,
            passed: report.passed(),
            model_count: report.model_count(),
            sample_ids: report.sample_ids(3),
            error: report.error().map(Into::into),
            added_to: added_to.map(|p| p.display().to_string()),
        })
    }

    /// Formats a cache clearing result.
    pub fn format_cache_cleared(&self, provider: Option<&str>, removed: usize) -> Result<String> {
        self.render(&CacheClearOutput { provider, removed })
    }
}
