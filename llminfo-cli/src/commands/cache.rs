//! Cache command - manage cached provider responses.

use anyhow::Result;
use clap::{Args, Subcommand};
use llminfo_store::CacheStore;
use tracing::info;

use super::load_settings;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the cache command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Remove cached entries.
    Clear {
        /// Only remove entries of this provider.
        #[arg(long, short)]
        provider: Option<String>,
    },

    /// Show the cache directory.
    Path,
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let cache = CacheStore::new(settings.cache_dir());

    match &args.action {
        CacheAction::Clear { provider } => {
            let removed = match provider {
                Some(name) => cache.clear(name).await?,
                None => cache.clear_all().await?,
            };
            info!(removed, provider = ?provider, "Cache cleared");

            match cli.format() {
                OutputFormat::Json => {
                    let formatter = JsonFormatter::new(cli.pretty);
                    println!(
                        "{}",
                        formatter.format_cache_cleared(provider.as_deref(), removed)?
                    );
                }
                OutputFormat::Text => println!("Removed {removed} cache entries"),
            }
        }
        CacheAction::Path => println!("{}", cache.dir().display()),
    }

    Ok(())
}
