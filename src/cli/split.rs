use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::catalog::store::TechnologyRegistry;
use crate::cli::{load_registry, OutputFormat, SplitOptions};
use crate::core::technology::Technology;
use crate::demux::pipeline::{split_bam, SplitSummary};
use crate::parsing::bam::detect_technology;

#[derive(Args)]
pub struct SplitArgs {
    /// Combined alignment file (BAM), local path or http(s) URL
    #[arg(required = true)]
    pub input: String,

    /// Path to a custom technology registry (JSON)
    #[arg(long)]
    pub registry: Option<PathBuf>,

    #[command(flatten)]
    pub options: SplitOptions,
}

/// Execute split subcommand
///
/// # Errors
///
/// Returns an error if the technology cannot be determined or splitting fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SplitArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_deref())?;
    let summary = split_input(&registry, &args.input, &args.options)?;

    match format {
        OutputFormat::Text => {
            println!(
                "Split {} records into {} files",
                summary.records,
                summary.outputs.len()
            );
            for output in &summary.outputs {
                println!("  {}", output.display());
            }
            if verbose && summary.incomplete > 0 {
                println!(
                    "{} records lacked barcode or UMI tags and were written with placeholders",
                    summary.incomplete
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Tsv => {
            println!("role\toutput");
            for (i, output) in summary.outputs.iter().enumerate() {
                println!("{}\t{}", i + 1, output.display());
            }
        }
    }
    Ok(())
}

/// Resolve the technology of a combined file and split it
pub(crate) fn split_input(
    registry: &TechnologyRegistry,
    input: &str,
    options: &SplitOptions,
) -> anyhow::Result<SplitSummary> {
    let technology = resolve_technology(registry, input, options.technology.as_deref())?;
    split_bam(input, technology, options.to_config())
        .with_context(|| format!("Failed to split {input}"))
}

fn resolve_technology<'r>(
    registry: &'r TechnologyRegistry,
    input: &str,
    name: Option<&str>,
) -> anyhow::Result<&'r Technology> {
    match name {
        Some(name) => registry
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Technology not found in registry: {name}")),
        None => Ok(detect_technology(input, registry)?),
    }
}
