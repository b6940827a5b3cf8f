//! Free-model selection.

use super::model::ModelRecord;
use std::cmp::Ordering;

/// Context length above which a free model is considered usable for
/// agentic coding.
pub const PREFERRED_MIN_CONTEXT: u64 = 32_000;

/// Picks the best free model.
///
/// Free models with more than [`PREFERRED_MIN_CONTEXT`] tokens of context are
/// preferred; when there are none, every free model is a candidate. The
/// cheapest prompt price wins, with missing prices sorted last. Ties keep
/// input order.
pub fn select_best_free_model(models: &[ModelRecord]) -> Option<&ModelRecord> {
    let free: Vec<&ModelRecord> = models.iter().filter(|m| m.is_free()).collect();

    let large: Vec<&ModelRecord> = free
        .iter()
        .copied()
        .filter(|m| m.context_length.is_some_and(|c| c > PREFERRED_MIN_CONTEXT))
        .collect();

    let mut candidates = if large.is_empty() { free } else { large };
    candidates.sort_by(|a, b| compare_prompt_price(a.prompt_price(), b.prompt_price()));
    candidates.first().copied()
}

fn compare_prompt_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
