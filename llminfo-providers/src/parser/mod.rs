//! Response parser strategies.
//!
//! Each [`ParserKind`] has one stateless parser converting a raw JSON
//! payload into canonical records. Optional fields are absence-tolerant;
//! only a missing or mistyped top-level `data` key is an error.

mod openai;
mod openrouter;

pub use openai::OpenAiCompatibleParser;
pub use openrouter::OpenRouterParser;

use llminfo_core::{CreditRecord, ModelRecord, ParserKind, Pricing, ProviderError};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Parser Trait
// ============================================================================

/// Payload does not have the shape a parser expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl ParseError {
    /// Attaches a provider name.
    pub fn into_provider_error(self, provider: &str) -> ProviderError {
        ProviderError::MalformedResponse {
            provider: provider.to_string(),
            message: self.0,
        }
    }
}

/// Converts provider payloads into canonical records.
pub trait ResponseParser: Send + Sync {
    /// The strategy key of this parser.
    fn kind(&self) -> ParserKind;

    /// Parses a models payload. Ids in the result are unique.
    fn parse_models(&self, payload: &Value) -> Result<Vec<ModelRecord>, ParseError>;

    /// Parses a credits payload; `None` if the strategy has no credits.
    fn parse_credits(&self, payload: &Value) -> Result<Option<CreditRecord>, ParseError>;
}

static OPENAI_COMPATIBLE: OpenAiCompatibleParser = OpenAiCompatibleParser;
static OPENROUTER: OpenRouterParser = OpenRouterParser;

/// Returns the parser registered for `kind`.
pub fn parser_for(kind: ParserKind) -> &'static dyn ResponseParser {
    match kind {
        ParserKind::OpenAiCompatible => &OPENAI_COMPATIBLE,
        ParserKind::OpenRouter => &OPENROUTER,
    }
}

// ============================================================================
// Shared Field Extraction
// ============================================================================

/// Returns the top-level `data` array.
fn data_array(payload: &Value) -> Result<&Vec<Value>, ParseError> {
    match payload.get("data") {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ParseError(format!(
            "`data` must be an array, found {}",
            json_type(other)
        ))),
        None => Err(ParseError("missing top-level `data` key".to_string())),
    }
}

/// Returns the top-level `data` object.
fn data_object(payload: &Value) -> Result<&Map<String, Value>, ParseError> {
    match payload.get("data") {
        Some(Value::Object(obj)) => Ok(obj),
        Some(other) => Err(ParseError(format!(
            "`data` must be an object, found {}",
            json_type(other)
        ))),
        None => Err(ParseError("missing top-level `data` key".to_string())),
    }
}

/// Maps every well-formed element of `items`, skipping elements that are not
/// objects or lack a string id, and keeping the first of duplicate ids.
fn collect_models<F>(items: &[Value], mut build: F) -> Vec<ModelRecord>
where
    F: FnMut(&Map<String, Value>, &str) -> ModelRecord,
{
    let mut seen = HashSet::new();
    let mut models = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            debug!(index, "Skipping non-object model entry");
            continue;
        };
        let Some(id) = obj.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()) else {
            debug!(index, "Skipping model entry without id");
            continue;
        };
        if !seen.insert(id.to_string()) {
            debug!(id, "Skipping duplicate model id");
            continue;
        }
        models.push(build(obj, id));
    }

    models
}

/// `context_length`, else `context_window`, as a non-negative integer.
fn context_length(obj: &Map<String, Value>) -> Option<u64> {
    ["context_length", "context_window"]
        .iter()
        .filter_map(|field| obj.get(*field))
        .find_map(as_whole_number)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn as_whole_number(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// Pricing object with string or number values rendered as decimal strings.
fn pricing(obj: &Map<String, Value>) -> Option<Pricing> {
    let raw = obj.get("pricing")?.as_object()?;
    Some(
        raw.iter()
            .filter_map(|(rate, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => decimal_string(n),
                    _ => return None,
                };
                Some((rate.clone(), text))
            })
            .collect(),
    )
}

/// Positional notation; `f64` display never uses an exponent.
fn decimal_string(n: &Number) -> String {
    if n.is_f64() {
        n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string())
    } else {
        n.to_string()
    }
}

/// A number or numeric string as `f64`; anything else is 0.
fn number_or_zero(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parser_for_every_kind() {
        for kind in ParserKind::all() {
            assert_eq!(parser_for(*kind).kind(), *kind);
        }
    }

    #[test]
    fn test_context_length_precedence() {
        let both = json!({"context_length": 8192, "context_window": 4096});
        assert_eq!(context_length(both.as_object().unwrap()), Some(8192));

        let window = json!({"context_window": 4096});
        assert_eq!(context_length(window.as_object().unwrap()), Some(4096));

        let bad_then_good = json!({"context_length": "big", "context_window": 4096});
        assert_eq!(context_length(bad_then_good.as_object().unwrap()), Some(4096));

        let float = json!({"context_length": 32768.0});
        assert_eq!(context_length(float.as_object().unwrap()), Some(32768));

        let negative = json!({"context_length": -1});
        assert_eq!(context_length(negative.as_object().unwrap()), None);
    }

    #[test]
    fn test_pricing_normalizes_values() {
        let obj = json!({"pricing": {"prompt": "0.00015", "completion": 0, "image": null, "tiers": [1]}});
        let rates = pricing(obj.as_object().unwrap()).unwrap();
        assert_eq!(rates.get("prompt").map(String::as_str), Some("0.00015"));
        assert_eq!(rates.get("completion").map(String::as_str), Some("0"));
        assert_eq!(rates.len(), 2);

        let empty = json!({"pricing": {}});
        assert_eq!(pricing(empty.as_object().unwrap()), Some(Pricing::new()));

        let missing = json!({});
        assert_eq!(pricing(missing.as_object().unwrap()), None);
    }

    #[test]
    fn test_pricing_small_numbers_have_no_exponent() {
        let obj = json!({"pricing": {"prompt": 0.000_000_15, "completion": 0.000_000_6, "request": 2}});
        let rates = pricing(obj.as_object().unwrap()).unwrap();
        assert_eq!(rates.get("prompt").map(String::as_str), Some("0.00000015"));
        assert_eq!(rates.get("completion").map(String::as_str), Some("0.0000006"));
        assert_eq!(rates.get("request").map(String::as_str), Some("2"));
        assert!(rates.values().all(|v| !v.contains('e')));
    }

    #[test]
    fn test_number_or_zero() {
        assert_eq!(number_or_zero(Some(&json!(12.5))), 12.5);
        assert_eq!(number_or_zero(Some(&json!("3"))), 3.0);
        assert_eq!(number_or_zero(Some(&json!(null))), 0.0);
        assert_eq!(number_or_zero(None), 0.0);
    }
}
