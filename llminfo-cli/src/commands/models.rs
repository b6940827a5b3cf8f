//! Models command - list models from one or all providers.

use anyhow::Result;
use clap::Args;
use llminfo_core::ModelRecord;
use llminfo_providers::QueryResult;
use std::time::Duration;
use tracing::info;

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the models command.
#[derive(Args, Debug, Default)]
pub struct ModelsArgs {
    /// Provider to query (default: all providers).
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Ignore cached results.
    #[arg(long)]
    pub force: bool,

    /// Overall deadline for the query, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Only list free models.
    #[arg(long)]
    pub free: bool,
}

/// Runs the models command.
pub async fn run(args: &ModelsArgs, cli: &Cli) -> Result<()> {
    info!(provider = ?args.provider, force = args.force, "Listing models");

    let ctx = AppContext::load(cli).await?;
    let engine = ctx.engine(args.force, args.timeout.map(Duration::from_secs));

    let results = match &args.provider {
        Some(name) => {
            let fetched = engine.models_for(name).await?;
            vec![QueryResult {
                provider: name.clone(),
                outcome: Ok(fetched),
            }]
        }
        None => engine.query_all_models().await,
    };

    match cli.format() {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_models(&results, args.free)?);
        }
        OutputFormat::Text => print_text(&results, args.free, cli),
    }

    Ok(())
}

fn print_text(results: &[QueryResult<Vec<ModelRecord>>], free_only: bool, cli: &Cli) {
    let formatter = TextFormatter::new(!cli.no_color);

    let rows: Vec<(&str, &ModelRecord)> = results
        .iter()
        .filter_map(|r| r.value().map(|models| (r.provider.as_str(), models)))
        .flat_map(|(provider, models)| models.iter().map(move |m| (provider, m)))
        .filter(|(_, m)| !free_only || m.is_free())
        .collect();

    if rows.is_empty() {
        println!("No models available");
    } else {
        println!("{}", formatter.format_models_table(&rows));
        println!();
        println!(
            "Total: {} models ({} free)",
            rows.len(),
            rows.iter().filter(|(_, m)| m.is_free()).count()
        );
    }

    for error in results.iter().filter_map(QueryResult::error) {
        eprintln!("{}", formatter.format_failure(error));
    }
}
