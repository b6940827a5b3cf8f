//! Best-free command - pick the best free model.

use anyhow::Result;
use clap::Args;
use llminfo_core::{ModelRecord, select_best_free_model};
use llminfo_providers::QueryResult;
use tracing::{info, warn};

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter, describe_error};
use crate::{Cli, OutputFormat};

/// Arguments for the best-free command.
#[derive(Args, Debug, Default)]
pub struct BestFreeArgs {
    /// Provider to search (default: all providers).
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Ignore cached results.
    #[arg(long)]
    pub force: bool,
}

/// Runs the best-free command.
pub async fn run(args: &BestFreeArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let engine = ctx.engine(args.force, None);

    let results = match &args.provider {
        Some(name) => vec![QueryResult {
            provider: name.clone(),
            outcome: Ok(engine.models_for(name).await?),
        }],
        None => engine.query_all_models().await,
    };

    let best = best_across(&results);
    info!(found = best.is_some(), "Best free model selected");

    match cli.format() {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_best_free(best)?);
        }
        OutputFormat::Text => match best {
            Some((provider, model)) => {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_best_free(provider, model));
            }
            None => eprintln!("No free models available"),
        },
    }

    Ok(())
}

/// Best free model over every successful result, with its provider.
fn best_across(results: &[QueryResult<Vec<ModelRecord>>]) -> Option<(&str, &ModelRecord)> {
    let mut providers = Vec::new();
    let mut models = Vec::new();

    for result in results {
        match &result.outcome {
            Ok(fetched) => {
                for model in &fetched.value {
                    providers.push(result.provider.as_str());
                    models.push(model.clone());
                }
            }
            Err(e) => warn!(error = %describe_error(e), "Skipping provider"),
        }
    }

    let best = select_best_free_model(&models)?;
    let index = models.iter().position(|m| std::ptr::eq(m, best))?;
    let provider = providers[index];

    results
        .iter()
        .filter(|r| r.provider == provider)
        .find_map(|r| r.value()?.iter().find(|m| m.id == best.id))
        .map(|model| (provider, model))
}
