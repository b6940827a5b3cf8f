//! Provider definition sources.
//!
//! A source is a YAML document of the form:
//!
//! ```yaml
//! providers:
//!   groq:
//!     name: groq
//!     base_url: https://api.groq.com/openai/v1
//!     api_key_env: GROQ_API_KEY
//!     models_endpoint: /models
//!     credits_endpoint: null
//!     parser: openai_compatible
//! ```
//!
//! Parsing a source keeps entry order and defers per-entry validation, so a
//! single bad entry never fails the whole source.

use llminfo_core::{DefinitionRecord, ProviderError};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

/// Definitions shipped with llminfo.
pub const BUILTIN_DEFINITIONS: &str = include_str!("../providers.yml");

const PROVIDERS_KEY: &str = "providers";

/// One entry of a source: its key and the record, or why it could not be
/// read as a record.
pub type SourceEntry = (String, Result<DefinitionRecord, ProviderError>);

// ============================================================================
// Source Parsing
// ============================================================================

/// Parses a definition source.
///
/// `label` names the source in errors (e.g. `builtin` or a file path). An
/// empty document is an empty source. A document that is not YAML, or whose
/// `providers` key is not a mapping, is an error for the whole source.
pub fn parse_source(text: &str, label: &str) -> Result<Vec<SourceEntry>, ProviderError> {
    if is_blank(text) {
        return Ok(Vec::new());
    }

    let document: Value = serde_yaml::from_str(text)
        .map_err(|e| ProviderError::config(label, PROVIDERS_KEY, format!("invalid YAML: {e}")))?;

    let providers = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(mut root) => root.remove(PROVIDERS_KEY).unwrap_or(Value::Null),
        _ => {
            return Err(ProviderError::config(
                label,
                PROVIDERS_KEY,
                "document must be a mapping",
            ));
        }
    };

    let entries = match providers {
        Value::Null => Mapping::new(),
        Value::Mapping(entries) => entries,
        _ => {
            return Err(ProviderError::config(
                label,
                PROVIDERS_KEY,
                "`providers` must be a mapping of name to definition",
            ));
        }
    };

    let parsed: Vec<SourceEntry> = entries.into_iter().map(parse_entry).collect();
    debug!(source = label, entries = parsed.len(), "Parsed definition source");
    Ok(parsed)
}

fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

fn parse_entry((key, value): (Value, Value)) -> SourceEntry {
    let Value::String(key) = key else {
        let shown = serde_yaml::to_string(&key)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        return (
            shown.clone(),
            Err(ProviderError::config(shown, "name", "provider key must be a string")),
        );
    };

    let record = serde_yaml::from_value::<DefinitionRecord>(value)
        .map_err(|e| ProviderError::config(key.clone(), "definition", e.to_string()));
    (key, record)
}

/// Reads and parses a source file; a missing file is an empty source.
pub async fn read_source_file(path: &Path) -> Result<Vec<SourceEntry>, ProviderError> {
    let label = path.display().to_string();
    match tokio::fs::read_to_string(path).await {
        Ok(text) => parse_source(&text, &label),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %label, "No user definition file");
            Ok(Vec::new())
        }
        Err(e) => Err(ProviderError::Storage {
            provider: label,
            message: e.to_string(),
        }),
    }
}

// ============================================================================
// Candidate Files
// ============================================================================

/// Parses a single flat definition, as found in a plugin file.
pub fn parse_candidate(text: &str, label: &str) -> Result<DefinitionRecord, ProviderError> {
    if is_blank(text) {
        return Err(ProviderError::config(label, "definition", "file is empty"));
    }

    serde_yaml::from_str::<Option<DefinitionRecord>>(text)
        .map_err(|e| ProviderError::config(label, "definition", format!("invalid YAML: {e}")))?
        .ok_or_else(|| ProviderError::config(label, "definition", "file is empty"))
}

/// Reads a plugin file holding one definition.
pub async fn read_candidate_file(path: &Path) -> Result<DefinitionRecord, ProviderError> {
    let label = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ProviderError::Storage {
            provider: label.clone(),
            message: e.to_string(),
        })?;
    parse_candidate(&text, &label)
}

// ============================================================================
// Source Writing
// ============================================================================

/// Appends `record` under `key` to a source document.
///
/// Everything else in the document, including entries that would not
/// validate, is kept as is. Fails with [`ProviderError::Duplicate`] if the
/// source already has an entry under `key`.
pub fn append_definition(
    text: &str,
    label: &str,
    key: &str,
    record: &DefinitionRecord,
) -> Result<String, ProviderError> {
    let mut root = if is_blank(text) {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(text) {
            Ok(Value::Mapping(root)) => root,
            Ok(Value::Null) => Mapping::new(),
            Ok(_) => {
                return Err(ProviderError::config(label, PROVIDERS_KEY, "document must be a mapping"));
            }
            Err(e) => {
                return Err(ProviderError::config(label, PROVIDERS_KEY, format!("invalid YAML: {e}")));
            }
        }
    };

    let mut entries = match root.remove(PROVIDERS_KEY) {
        None | Some(Value::Null) => Mapping::new(),
        Some(Value::Mapping(entries)) => entries,
        Some(_) => {
            return Err(ProviderError::config(
                label,
                PROVIDERS_KEY,
                "`providers` must be a mapping of name to definition",
            ));
        }
    };

    if entries.contains_key(key) {
        return Err(ProviderError::Duplicate(key.to_string()));
    }

    let value = serde_yaml::to_value(record)
        .map_err(|e| ProviderError::config(key, "definition", e.to_string()))?;
    entries.insert(Value::String(key.to_string()), value);
    root.insert(Value::String(PROVIDERS_KEY.to_string()), Value::Mapping(entries));

    serde_yaml::to_string(&Value::Mapping(root))
        .map_err(|e| ProviderError::config(label, PROVIDERS_KEY, e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
