//! Credits command - show a provider's credit balance.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the credits command.
#[derive(Args, Debug)]
pub struct CreditsArgs {
    /// Provider to query.
    #[arg(long, short, default_value = "openrouter")]
    pub provider: String,

    /// Ignore cached results.
    #[arg(long)]
    pub force: bool,
}

/// Runs the credits command.
pub async fn run(args: &CreditsArgs, cli: &Cli) -> Result<()> {
    info!(provider = %args.provider, "Checking credits");

    let ctx = AppContext::load(cli).await?;
    let fetched = ctx
        .engine(args.force, None)
        .credits_for(&args.provider)
        .await?;

    match cli.format() {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_credits(&args.provider, &fetched)?);
        }
        OutputFormat::Text => match &fetched.value {
            Some(credits) => {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_credits(credits));
            }
            None => eprintln!("Credits not available for {}", args.provider),
        },
    }

    Ok(())
}
