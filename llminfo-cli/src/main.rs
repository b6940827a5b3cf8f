// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! llminfo CLI - model and credit metadata from LLM provider APIs.
//!
//! # Examples
//!
//! ```bash
//! # Models from every configured provider
//! llminfo models
//!
//! # One provider, bypassing the cache
//! llminfo models --provider groq --force
//!
//! # OpenRouter credit balance as JSON
//! llminfo --json credits
//!
//! # Cheapest free model with a large context window
//! llminfo best-free
//!
//! # Try a provider definition, then keep it
//! llminfo test-provider plugin/together.yml
//! llminfo import-provider plugin/together.yml
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use llminfo_core::ProviderError;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{best_free, cache, credits, import_provider, models, providers, test_provider};

// ============================================================================
// CLI Definition
// ============================================================================

/// llminfo CLI - model and credit metadata from LLM provider APIs.
#[derive(Parser)]
#[command(name = "llminfo")]
#[command(about = "Model and credit metadata from LLM provider APIs")]
#[command(long_about = r"
llminfo lists models and credit balances from LLM provider APIs.

Built-in providers:
  • OpenRouter (openrouter)
  • Groq (groq)
  • Cerebras (cerebras)
  • OpenAI (openai)

More OpenAI-compatible providers can be added with a YAML definition; see
`llminfo test-provider` and `llminfo import-provider`.

Examples:
  llminfo models                     # All providers
  llminfo models --provider groq     # Single provider
  llminfo --json credits             # JSON output
  llminfo best-free                  # Best free model
")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Settings file (default: <config dir>/llminfo/config.json).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logging).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List models from one or all providers.
    #[command(visible_alias = "m")]
    Models(models::ModelsArgs),

    /// Show the credit balance of a provider.
    #[command(visible_alias = "c")]
    Credits(credits::CreditsArgs),

    /// List registered providers.
    #[command(visible_alias = "p")]
    Providers,

    /// Pick the best free model.
    BestFree(best_free::BestFreeArgs),

    /// Test a provider definition without saving it.
    TestProvider(test_provider::TestProviderArgs),

    /// Test a provider definition and add it to the user providers file.
    ImportProvider(test_provider::TestProviderArgs),

    /// Manage the response cache.
    Cache(cache::CacheArgs),
}

impl Cli {
    /// Returns the selected output format.
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("llminfo=debug")
    } else {
        EnvFilter::new("llminfo=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Models(args) => models::run(args, &cli).await,
        Commands::Credits(args) => credits::run(args, &cli).await,
        Commands::Providers => providers::run(&cli).await,
        Commands::BestFree(args) => best_free::run(args, &cli).await,
        Commands::TestProvider(args) => test_provider::run(args, &cli).await,
        Commands::ImportProvider(args) => import_provider::run(args, &cli).await,
        Commands::Cache(args) => cache::run(args, &cli).await,
    };

    if let Err(e) = result {
        eprintln!("error: {}", render_error(&e));
        std::process::exit(1);
    }

    Ok(())
}

/// One-line rendering of a top-level failure.
fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ProviderError>() {
        Some(provider_error) => output::describe_error(provider_error),
        None => format!("{err:#}"),
    }
}
