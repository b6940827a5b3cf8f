//! Text output formatting with tables and colors.

use llminfo_core::{CreditRecord, ModelRecord, ProviderError};
use llminfo_providers::{Origin, ProviderInfo, RejectedDefinition, TestReport};

use super::describe_error;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const MAGENTA: &str = "\x1b[35m";

const MODEL_HEADERS: [&str; 4] = ["Provider", "Model ID", "Name", "Context"];

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ------------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------------

    /// Formats `(provider, model)` rows as an aligned table.
    pub fn format_models_table(&self, rows: &[(&str, &ModelRecord)]) -> String {
        let cells: Vec<[String; 4]> = rows
            .iter()
            .map(|(provider, model)| {
                [
                    (*provider).to_string(),
                    model.id.clone(),
                    model.name.clone(),
                    format_context(model.context_length),
                ]
            })
            .collect();

        let mut widths = MODEL_HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut lines = Vec::with_capacity(cells.len() + 2);
        let header: Vec<String> = MODEL_HEADERS
            .iter()
            .zip(widths)
            .map(|(h, w)| pad(h, w))
            .collect();
        lines.push(self.bold(header.join("  ").trim_end()));
        lines.push("─".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));

        for (row, (_, model)) in cells.iter().zip(rows) {
            let id = pad(&row[1], widths[1]);
            let id = if model.is_free() { self.green(&id) } else { self.cyan(&id) };
            let line = format!(
                "{}  {}  {}  {}",
                self.magenta(&pad(&row[0], widths[0])),
                id,
                pad(&row[2], widths[2]),
                self.yellow(&row[3]),
            );
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Formats a per-provider failure line.
    pub fn format_failure(&self, err: &ProviderError) -> String {
        format!("{} {}", self.red("✗"), describe_error(err))
    }

    // ------------------------------------------------------------------------
    // Credits
    // ------------------------------------------------------------------------

    /// Formats a credit balance.
    pub fn format_credits(&self, credits: &CreditRecord) -> String {
        let remaining = format!("${:.2}", credits.remaining());
        let remaining = if credits.is_overdrawn() {
            self.red(&remaining)
        } else {
            self.green(&remaining)
        };

        [
            format!("Total Credits: ${:.2}", credits.total_credits),
            format!("Usage:         ${:.2}", credits.usage),
            format!("Remaining:     {remaining}"),
        ]
        .join("\n")
    }

    // ------------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------------

    /// Formats the providers table header.
    pub fn format_providers_header(&self) -> String {
        self.bold(&format!(
            "{:<14} {:<8} {:<8} {}",
            "Provider", "Origin", "Credits", "Base URL"
        ))
    }

    /// Formats one provider line.
    pub fn format_provider_line(&self, info: &ProviderInfo) -> String {
        let credits = if info.supports_credits {
            self.green(&format!("{:<8}", "yes"))
        } else {
            self.dim(&format!("{:<8}", "no"))
        };
        let origin = format!("{:<8}", info.origin);
        let origin = match info.origin {
            Origin::Builtin => self.dim(&origin),
            Origin::User | Origin::Code => self.cyan(&origin),
        };

        format!(
            "{:<14} {} {} {}",
            info.name,
            origin,
            credits,
            info.base_url.as_deref().unwrap_or("-"),
        )
    }

    /// Formats a rejected definition.
    pub fn format_rejected_line(&self, rejected: &RejectedDefinition) -> String {
        format!(
            "{} {} ({}): {}",
            self.red("✗"),
            rejected.name,
            rejected.origin,
            describe_error(&rejected.error)
        )
    }

    // ------------------------------------------------------------------------
    // Best Free
    // ------------------------------------------------------------------------

    /// Formats the best free model.
    pub fn format_best_free(&self, provider: &str, model: &ModelRecord) -> String {
        let mut lines = vec![format!("Best free model: {}", self.bold(&model.id))];
        if model.name != model.id {
            lines.push(format!("Name:     {}", model.name));
        }
        lines.push(format!("Provider: {}", self.magenta(provider)));
        lines.push(format!("Context:  {}", format_context(model.context_length)));
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Stage Reports
    // ------------------------------------------------------------------------

    /// Formats a stage report.
    pub fn format_test_report(&self, report: &TestReport) -> String {
        let mut lines = vec![
            format!("Testing provider: {}", self.bold(&report.provider)),
            format!("Base URL: {}", report.base_url),
        ];

        match &report.outcome {
            Ok(models) => {
                lines.push(format!(
                    "{} Successfully retrieved {} models",
                    self.green("✓"),
                    models.len()
                ));
                let sample = report.sample_ids(3);
                if !sample.is_empty() {
                    lines.push(String::new());
                    lines.push("First few models:".to_string());
                    lines.extend(sample.iter().map(|id| format!("  - {id}")));
                }
            }
            Err(e) => lines.push(self.format_failure(e)),
        }

        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Color Helpers
    // ------------------------------------------------------------------------

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn magenta(&self, text: &str) -> String {
        self.paint(MAGENTA, text)
    }
}

/// Context length with thousands separators, or `N/A`.
pub fn format_context(context_length: Option<u64>) -> String {
    let Some(n) = context_length else {
        return "N/A".to_string();
    };

    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}
