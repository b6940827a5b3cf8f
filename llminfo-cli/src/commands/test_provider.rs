//! Test-provider command - stage a definition without saving it.

use anyhow::Result;
use clap::Args;
use llminfo_providers::{TestReport, read_candidate_file};
use std::path::{Path, PathBuf};
use tracing::info;

use super::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the test-provider and import-provider commands.
#[derive(Args, Debug)]
pub struct TestProviderArgs {
    /// Path to a YAML file holding one provider definition.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// API key to test with (default: the definition's environment variable).
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// Runs the test-provider command.
pub async fn run(args: &TestProviderArgs, cli: &Cli) -> Result<()> {
    info!(file = %args.file.display(), "Testing provider definition");

    let ctx = AppContext::load(cli).await?;
    let candidate = read_candidate_file(&args.file).await?;
    let report = ctx.registry.stage(candidate, args.api_key.as_deref()).await;

    print_report(&report, None, cli)?;
    into_result(report)
}

/// Prints a stage report, with the file it was committed to if any.
pub fn print_report(report: &TestReport, added_to: Option<&Path>, cli: &Cli) -> Result<()> {
    match cli.format() {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_test_report(report, added_to)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_test_report(report));
        }
    }
    Ok(())
}

/// A failed report becomes the command's error.
pub fn into_result(report: TestReport) -> Result<()> {
    match report.outcome {
        Ok(_) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
