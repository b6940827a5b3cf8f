//! OpenRouter response parser.

use llminfo_core::{CreditRecord, ModelRecord, ParserKind};
use serde_json::Value;
use tracing::debug;

use super::{
    ParseError, ResponseParser, collect_models, context_length, data_array, data_object,
    number_or_zero, pricing,
};

/// Parser for the OpenRouter API.
///
/// Models carry a display `name` and a `pricing` table. Credits come from a
/// separate endpoint shaped `{"data": {"total_credits", "total_usage"}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRouterParser;

impl ResponseParser for OpenRouterParser {
    fn kind(&self) -> ParserKind {
        ParserKind::OpenRouter
    }

    fn parse_models(&self, payload: &Value) -> Result<Vec<ModelRecord>, ParseError> {
        let items = data_array(payload)?;
        debug!(entries = items.len(), "Parsing OpenRouter models");

        Ok(collect_models(items, |obj, id| {
            let name = obj
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(id);

            ModelRecord {
                id: id.to_string(),
                name: name.to_string(),
                context_length: context_length(obj),
                pricing: pricing(obj),
            }
        }))
    }

    fn parse_credits(&self, payload: &Value) -> Result<Option<CreditRecord>, ParseError> {
        let data = data_object(payload)?;
        Ok(Some(CreditRecord::new(
            number_or_zero(data.get("total_credits")),
            number_or_zero(data.get("total_usage")),
        )))
    }
}
