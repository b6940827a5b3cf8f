//! Provider definitions.
//!
//! A [`DefinitionRecord`] is what a definition file contains: every field
//! optional, nothing checked. [`DefinitionRecord::validate`] turns it into a
//! [`ProviderDefinition`], which is always well-formed.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Cache TTL applied when a definition does not set one.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// Parser Kind
// ============================================================================

/// Closed set of response parsing strategies, keyed by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParserKind {
    /// `{"data": [{"id", "context_window"|"context_length"}]}`, no credits.
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    /// Aggregator shape with names, pricing and a credits endpoint.
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl ParserKind {
    /// Returns the configuration key of this parser.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible => "openai_compatible",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Looks a parser up by its configuration key.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == name)
    }

    /// Returns every parser kind.
    pub fn all() -> &'static [ParserKind] {
        &[Self::OpenAiCompatible, Self::OpenRouter]
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Provider Definition
// ============================================================================

/// A validated provider definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDefinition {
    /// Unique lowercase key.
    pub name: String,
    /// Absolute HTTPS URL without trailing slash.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Path of the models endpoint, starting with `/`.
    pub models_endpoint: String,
    /// Path of the credits endpoint; `None` means credits are unsupported.
    pub credits_endpoint: Option<String>,
    /// Parsing strategy.
    pub parser: ParserKind,
    /// Cache TTL override in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

impl ProviderDefinition {
    /// Full URL of the models endpoint.
    pub fn models_url(&self) -> String {
        format!("{}{}", self.base_url, self.models_endpoint)
    }

    /// Full URL of the credits endpoint, if the provider has one.
    pub fn credits_url(&self) -> Option<String> {
        self.credits_endpoint
            .as_ref()
            .map(|path| format!("{}{}", self.base_url, path))
    }

    /// Returns true if the provider exposes a credits endpoint.
    pub fn supports_credits(&self) -> bool {
        self.credits_endpoint.is_some()
    }

    /// Cache TTL for this provider's entries.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs
            .map_or(DEFAULT_CACHE_TTL, Duration::from_secs)
    }

    /// Converts back to the unvalidated record form, e.g. for writing.
    pub fn to_record(&self) -> DefinitionRecord {
        DefinitionRecord {
            name: Some(self.name.clone()),
            base_url: Some(self.base_url.clone()),
            api_key_env: Some(self.api_key_env.clone()),
            models_endpoint: Some(self.models_endpoint.clone()),
            credits_endpoint: self.credits_endpoint.clone(),
            parser: Some(self.parser.as_str().to_string()),
            cache_ttl_secs: self.cache_ttl_secs,
        }
    }
}

// ============================================================================
// Definition Record
// ============================================================================

/// Unvalidated provider definition as found in a definition source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    /// Provider name; falls back to the mapping key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key environment variable.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Models endpoint path.
    #[serde(default)]
    pub models_endpoint: Option<String>,
    /// Credits endpoint path.
    #[serde(default)]
    pub credits_endpoint: Option<String>,
    /// Parser key.
    #[serde(default)]
    pub parser: Option<String>,
    /// Cache TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

impl DefinitionRecord {
    /// Name this record would register under, if it has one.
    pub fn effective_name<'a>(&'a self, key: Option<&'a str>) -> Option<&'a str> {
        self.name.as_deref().or(key)
    }

    /// Validates the record.
    ///
    /// `key` is the mapping key the record was found under, if any. The
    /// record is accepted or rejected as a whole; the error names the first
    /// offending field.
    pub fn validate(self, key: Option<&str>) -> Result<ProviderDefinition, ProviderError> {
        let label = self
            .effective_name(key)
            .unwrap_or("<unnamed>")
            .to_string();

        let name = match (self.name.as_deref(), key) {
            (Some(name), Some(key)) if name != key => {
                return Err(ProviderError::config(
                    label,
                    "name",
                    format!("does not match its key `{key}`"),
                ));
            }
            (Some(name), _) | (None, Some(name)) => name.to_string(),
            (None, None) => return Err(ProviderError::config(label, "name", "is required")),
        };
        if !is_valid_name(&name) {
            return Err(ProviderError::config(
                label,
                "name",
                "must be lowercase letters, digits, '-' or '_'",
            ));
        }

        let base_url = validate_base_url(&label, self.base_url.as_deref())?;

        let api_key_env = required(&label, "api_key_env", self.api_key_env)?;
        if !is_valid_env_var(&api_key_env) {
            return Err(ProviderError::config(
                label,
                "api_key_env",
                "must be an upper-case environment variable name",
            ));
        }

        let models_endpoint = normalize_path(required(&label, "models_endpoint", self.models_endpoint)?);

        let credits_endpoint = match self.credits_endpoint {
            None => None,
            Some(path) if path.trim().is_empty() => {
                return Err(ProviderError::config(label, "credits_endpoint", "must not be empty"));
            }
            Some(path) => Some(normalize_path(path)),
        };

        let parser_key = required(&label, "parser", self.parser)?;
        let parser = ParserKind::from_name(&parser_key).ok_or_else(|| {
            ProviderError::config(
                label.clone(),
                "parser",
                format!("unknown parser `{parser_key}`"),
            )
        })?;

        if self.cache_ttl_secs == Some(0) {
            return Err(ProviderError::config(label, "cache_ttl_secs", "must be positive"));
        }

        Ok(ProviderDefinition {
            name,
            base_url,
            api_key_env,
            models_endpoint,
            credits_endpoint,
            parser,
            cache_ttl_secs: self.cache_ttl_secs,
        })
    }
}

// ============================================================================
// Field Checks
// ============================================================================

fn required(label: &str, field: &str, value: Option<String>) -> Result<String, ProviderError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ProviderError::config(label, field, "is required")),
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn is_valid_env_var(var: &str) -> bool {
    !var.starts_with(|c: char| c.is_ascii_digit())
        && var
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn normalize_path(path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

fn validate_base_url(label: &str, raw: Option<&str>) -> Result<String, ProviderError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ProviderError::config(label, "base_url", "is required"));
    }

    let parsed = Url::parse(raw)
        .map_err(|e| ProviderError::config(label, "base_url", format!("not a valid URL: {e}")))?;

    if parsed.scheme() != "https" {
        return Err(ProviderError::config(label, "base_url", "must use https"));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ProviderError::config(label, "base_url", "must include a host"));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn groq() -> DefinitionRecord {
        DefinitionRecord {
            name: Some("groq".to_string()),
            base_url: Some("https://api.groq.com/openai/v1/".to_string()),
            api_key_env: Some("GROQ_API_KEY".to_string()),
            models_endpoint: Some("models".to_string()),
            credits_endpoint: None,
            parser: Some("openai_compatible".to_string()),
            cache_ttl_secs: None,
        }
    }

    fn field_of(err: &ProviderError) -> &str {
        match err {
            ProviderError::Config { field, .. } => field,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let def = groq().validate(Some("groq")).unwrap();
        assert_eq!(def.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(def.models_endpoint, "/models");
        assert_eq!(def.models_url(), "https://api.groq.com/openai/v1/models");
        assert_eq!(def.parser, ParserKind::OpenAiCompatible);
        assert!(!def.supports_credits());
        assert_eq!(def.credits_url(), None);
        assert_eq!(def.cache_ttl(), DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_name_falls_back_to_key() {
        let record = DefinitionRecord {
            name: None,
            ..groq()
        };
        assert_eq!(record.validate(Some("groq")).unwrap().name, "groq");
    }

    #[test]
    fn test_name_must_match_key() {
        let err = groq().validate(Some("other")).unwrap_err();
        assert_eq!(field_of(&err), "name");
        assert_eq!(err.provider(), "groq");
    }

    #[test]
    fn test_rejects_each_field() {
        let cases: Vec<(DefinitionRecord, &str)> = vec![
            (DefinitionRecord { name: Some("Groq".into()), ..groq() }, "name"),
            (DefinitionRecord { base_url: Some("http://api.groq.com".into()), ..groq() }, "base_url"),
            (DefinitionRecord { base_url: Some("not a url".into()), ..groq() }, "base_url"),
            (DefinitionRecord { base_url: None, ..groq() }, "base_url"),
            (DefinitionRecord { api_key_env: Some(String::new()), ..groq() }, "api_key_env"),
            (DefinitionRecord { api_key_env: Some("groq_key".into()), ..groq() }, "api_key_env"),
            (DefinitionRecord { api_key_env: Some("1KEY".into()), ..groq() }, "api_key_env"),
            (DefinitionRecord { models_endpoint: Some("  ".into()), ..groq() }, "models_endpoint"),
            (DefinitionRecord { credits_endpoint: Some(String::new()), ..groq() }, "credits_endpoint"),
            (DefinitionRecord { parser: Some("anthropic".into()), ..groq() }, "parser"),
            (DefinitionRecord { parser: None, ..groq() }, "parser"),
            (DefinitionRecord { cache_ttl_secs: Some(0), ..groq() }, "cache_ttl_secs"),
        ];

        for (record, field) in cases {
            let err = record.validate(None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config);
            assert_eq!(field_of(&err), field);
        }
    }

    #[test]
    fn test_credits_endpoint_and_ttl() {
        let record = DefinitionRecord {
            credits_endpoint: Some("credits".to_string()),
            parser: Some("openrouter".to_string()),
            cache_ttl_secs: Some(60),
            ..groq()
        };
        let def = record.validate(None).unwrap();
        assert_eq!(def.credits_url().as_deref(), Some("https://api.groq.com/openai/v1/credits"));
        assert_eq!(def.cache_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_parser_kind_names() {
        for kind in ParserKind::all() {
            assert_eq!(ParserKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(ParserKind::from_name("nope"), None);
    }

    #[test]
    fn test_to_record_revalidates() {
        let def = groq().validate(None).unwrap();
        assert_eq!(def.to_record().validate(Some("groq")).unwrap(), def);
    }
}
