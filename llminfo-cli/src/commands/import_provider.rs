//! Import-provider command - stage a definition, then save it.

use anyhow::Result;
use llminfo_providers::read_candidate_file;
use tracing::info;

use super::AppContext;
use super::test_provider::{TestProviderArgs, into_result, print_report};
use crate::{Cli, OutputFormat};

/// Runs the import-provider command.
///
/// The definition is committed only if the live test passes.
pub async fn run(args: &TestProviderArgs, cli: &Cli) -> Result<()> {
    info!(file = %args.file.display(), "Importing provider definition");

    let ctx = AppContext::load(cli).await?;
    let candidate = read_candidate_file(&args.file).await?;
    let report = ctx
        .registry
        .stage(candidate.clone(), args.api_key.as_deref())
        .await;

    if !report.passed() {
        print_report(&report, None, cli)?;
        return into_result(report);
    }

    let definition = ctx.registry.commit(candidate).await?;
    let target = ctx.registry.user_source();
    print_report(&report, target, cli)?;

    if cli.format() == OutputFormat::Text {
        println!();
        match target {
            Some(path) => println!(
                "✓ Provider '{}' added to {}",
                definition.name,
                path.display()
            ),
            None => println!("✓ Provider '{}' added", definition.name),
        }
        println!("Plugin file can be deleted: {}", args.file.display());
    }

    Ok(())
}
