//! Output formatting for CLI.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use llminfo_core::ProviderError;

/// Renders `err` as `<provider>: <kind>: <message>`.
pub fn describe_error(err: &ProviderError) -> String {
    let full = err.to_string();
    let prefix = format!("{}: ", err.provider());
    let message = full.strip_prefix(&prefix).unwrap_or(&full);
    format!("{}: {}: {}", err.provider(), err.kind(), message)
}
