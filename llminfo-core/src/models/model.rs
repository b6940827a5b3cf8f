//! Canonical model record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id suffix that marks a model as free of charge.
pub const FREE_MODEL_SUFFIX: &str = ":free";

/// Mapping of rate name (e.g. `prompt`, `completion`) to a decimal string.
pub type Pricing = BTreeMap<String, String>;

// ============================================================================
// Model Record
// ============================================================================

/// A model as reported by a provider, normalized to one shape.
///
/// Whether a model is free is never stored: [`ModelRecord::is_free`] derives
/// it from the id and pricing, and deserialization drops any `is_free` flag
/// found in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ModelFields", into = "ModelFields")]
pub struct ModelRecord {
    /// Identifier, unique within one provider.
    pub id: String,
    /// Display label (equal to the id when the provider has none).
    pub name: String,
    /// Context window in tokens.
    pub context_length: Option<u64>,
    /// Per-rate prices as decimal strings.
    pub pricing: Option<Pricing>,
}

impl ModelRecord {
    /// Creates a record with the given id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            context_length: None,
            pricing: None,
        }
    }

    /// Creates a record whose display name is its id.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id)
    }

    /// Sets the context length.
    pub fn with_context_length(mut self, context_length: u64) -> Self {
        self.context_length = Some(context_length);
        self
    }

    /// Sets the pricing table.
    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    /// Returns true if the model is free of charge.
    pub fn is_free(&self) -> bool {
        is_free_model(&self.id, self.pricing.as_ref())
    }

    /// Returns the prompt price, if present and numeric.
    pub fn prompt_price(&self) -> Option<f64> {
        self.pricing
            .as_ref()
            .and_then(|p| p.get("prompt"))
            .and_then(|v| v.parse::<f64>().ok())
    }
}

/// Free-model convention shared by every provider.
///
/// A model is free when its id carries the reserved `:free` suffix, or when
/// it publishes a non-empty pricing table whose every rate is zero.
pub fn is_free_model(id: &str, pricing: Option<&Pricing>) -> bool {
    if id.ends_with(FREE_MODEL_SUFFIX) {
        return true;
    }

    pricing.is_some_and(|rates| {
        !rates.is_empty()
            && rates
                .values()
                .all(|v| v.trim().parse::<f64>().is_ok_and(|n| n == 0.0))
    })
}

// ============================================================================
// Wire Shape
// ============================================================================

#[derive(Serialize, Deserialize)]
struct ModelFields {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pricing: Option<Pricing>,
    #[serde(default)]
    is_free: bool,
}

impl From<ModelFields> for ModelRecord {
    fn from(fields: ModelFields) -> Self {
        let name = fields.name.unwrap_or_else(|| fields.id.clone());
        Self {
            id: fields.id,
            name,
            context_length: fields.context_length,
            pricing: fields.pricing,
        }
    }
}

impl From<ModelRecord> for ModelFields {
    fn from(record: ModelRecord) -> Self {
        let is_free = record.is_free();
        Self {
            id: record.id,
            name: Some(record.name),
            context_length: record.context_length,
            pricing: record.pricing,
            is_free,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
