use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_registry, OutputFormat};
use crate::core::types::ReadSubstring;

#[derive(Args)]
pub struct TechnologiesArgs {
    /// Path to a custom technology registry (JSON)
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

/// Execute technologies subcommand
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: TechnologiesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_deref())?;

    match format {
        OutputFormat::Text => {
            let name_width = registry
                .technologies()
                .iter()
                .map(|t| t.name.len())
                .max()
                .unwrap_or(4)
                .max(4);

            println!("Technologies ({})\n", registry.len());
            println!(
                "{:<name_w$} {:>5} {:<18} {:<18} {:>8} {:<9}",
                "Name",
                "Files",
                "Barcode",
                "UMI",
                "Sequence",
                "Whitelist",
                name_w = name_width
            );
            println!("{}", "-".repeat(name_width + 63));

            for t in registry.technologies() {
                println!(
                    "{:<name_w$} {:>5} {:<18} {:<18} {:>8} {:<9}",
                    t.name,
                    t.file_count,
                    regions(&t.barcode),
                    regions(&t.umi),
                    t.sequence.stream,
                    if t.has_whitelist() { "yes" } else { "no" },
                    name_w = name_width
                );
                if verbose {
                    println!("  └─ {}", t.description);
                    if let Some(tags) = &t.alignment_tags {
                        println!("     BAM tags: {}", tags.names().join(" "));
                    }
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", registry.to_json()?);
        }
        OutputFormat::Tsv => {
            println!("name\tdescription\tfile_count\tbarcode\tumi\tsequence\twhitelist");
            for t in registry.technologies() {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    t.name,
                    t.description,
                    t.file_count,
                    regions(&t.barcode),
                    regions(&t.umi),
                    t.sequence,
                    t.whitelist.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

fn regions(substrings: &[ReadSubstring]) -> String {
    substrings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
