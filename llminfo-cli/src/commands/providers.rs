//! Providers command - list registered providers.

use anyhow::Result;
use tracing::info;

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the providers command.
pub async fn run(cli: &Cli) -> Result<()> {
    info!("Listing providers");

    let ctx = AppContext::load(cli).await?;
    let providers = ctx.registry.describe();
    let rejected = ctx.registry.rejected();

    match cli.format() {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_providers_header());
            println!("{}", "─".repeat(70));

            for info in &providers {
                println!("{}", formatter.format_provider_line(info));
            }

            println!();
            println!(
                "Total: {} providers ({} with credits)",
                providers.len(),
                providers.iter().filter(|p| p.supports_credits).count()
            );

            if !rejected.is_empty() {
                println!();
                println!("Rejected definitions:");
                for r in rejected {
                    println!("{}", formatter.format_rejected_line(r));
                }
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_providers(&providers, rejected)?);
        }
    }

    Ok(())
}
