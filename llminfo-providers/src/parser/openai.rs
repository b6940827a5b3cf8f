//! OpenAI-compatible response parser.

use llminfo_core::{CreditRecord, ModelRecord, ParserKind};
use serde_json::Value;
use tracing::debug;

use super::{ParseError, ResponseParser, collect_models, context_length, data_array, pricing};

/// Parser for `/models` responses in the OpenAI list shape.
///
/// ```json
/// {"object": "list", "data": [{"id": "llama-3.1-8b-instant", "context_window": 131072}]}
/// ```
///
/// Models have no display name; the id is used. Credits are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiCompatibleParser;

impl ResponseParser for OpenAiCompatibleParser {
    fn kind(&self) -> ParserKind {
        ParserKind::OpenAiCompatible
    }

    fn parse_models(&self, payload: &Value) -> Result<Vec<ModelRecord>, ParseError> {
        let items = data_array(payload)?;
        debug!(entries = items.len(), "Parsing OpenAI-compatible models");

        Ok(collect_models(items, |obj, id| ModelRecord {
            id: id.to_string(),
            name: id.to_string(),
            context_length: context_length(obj),
            pricing: pricing(obj),
        }))
    }

    fn parse_credits(&self, _payload: &Value) -> Result<Option<CreditRecord>, ParseError> {
        Ok(None)
    }
}
