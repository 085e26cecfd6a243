use std::path::PathBuf;

use clap::Args;

use crate::catalog::store::TechnologyRegistry;
use crate::cli::{load_registry, split, OutputFormat, SplitOptions};
use crate::core::hypothesis::Hypothesis;
use crate::matching::engine::{
    ClassificationOutcome, Classifier, ClassifierConfig, DEFAULT_BARCODE_THRESHOLD,
};
use crate::matching::enumerate::enumerate;
use crate::matching::extraction::extract;
use crate::matching::scoring::ScoreReport;
use crate::parsing::bam::is_bam_file;
use crate::parsing::fastq::sample_files;

/// Reads skipped at the start of every file; the first reads of a run are
/// often of lower quality
pub const DEFAULT_SKIP: usize = 1000;

/// Reads sampled from every file after skipping
pub const DEFAULT_READS: usize = 100_000;

#[derive(Args)]
pub struct IdentifyArgs {
    /// Read files (FASTQ, optionally gzipped; local paths or http(s) URLs),
    /// or a single combined BAM to split first
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Number of reads to skip at the start of each file
    #[arg(short, long, default_value_t = DEFAULT_SKIP)]
    pub skip: usize,

    /// Number of reads to sample from each file
    #[arg(short = 'n', long, default_value_t = DEFAULT_READS)]
    pub reads: usize,

    /// Directory containing barcode whitelists named as in the registry.
    /// Without one, whitelist-backed technologies are scored by barcode
    /// diversity alone, and technologies sharing a barcode layout (10xv2 and
    /// 10xv3 on long enough reads) cannot be told apart
    #[arg(long, env = "TECH_SOLVER_WHITELIST_DIR")]
    pub whitelist_dir: Option<PathBuf>,

    /// Path to a custom technology registry (JSON)
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Fraction of sampled barcodes that must be whitelisted
    #[arg(long, default_value_t = DEFAULT_BARCODE_THRESHOLD)]
    pub barcode_threshold: f64,

    #[command(flatten)]
    pub split: SplitOptions,
}

/// Execute identify subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read, or if the technology is
/// ambiguous or cannot be identified.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: IdentifyArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = load_registry(args.registry.as_deref())?;

    let files = if args.inputs.len() == 1 && is_bam_file(&args.inputs[0]) {
        let summary = split::split_input(&registry, &args.inputs[0], &args.split)?;
        if verbose {
            eprintln!(
                "Split {} records into {} files",
                summary.records,
                summary.outputs.len()
            );
        }
        summary
            .outputs
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    } else {
        args.inputs.clone()
    };

    let hypotheses = enumerate(files.len(), registry.technologies());
    if hypotheses.is_empty() {
        anyhow::bail!(
            "No technology in the registry accepts {} input files",
            files.len()
        );
    }

    let sample = sample_files(&files, args.skip, args.reads)?;
    if verbose {
        eprintln!(
            "Sampled {} reads from each of {} files, {} hypotheses",
            sample.len(),
            files.len(),
            hypotheses.len()
        );
    }
    if sample.is_empty() {
        anyhow::bail!(
            "No reads left to sample after skipping {} reads per file",
            args.skip
        );
    }

    let extraction = extract(&sample, &hypotheses);
    let mut classifier = Classifier::new(ClassifierConfig {
        barcode_threshold: args.barcode_threshold,
        whitelist_dir: args.whitelist_dir.clone(),
    });
    let classification = classifier.evaluate(&extraction, sample.len(), &hypotheses);

    if verbose {
        for report in &classification.reports {
            eprintln!("  {report}");
        }
    }

    match classification.outcome {
        ClassificationOutcome::Identified(hypothesis) => {
            print_result(&hypothesis, &files, &classification.reports, format)?;
            Ok(())
        }
        ClassificationOutcome::Ambiguous(candidates) => {
            eprintln!("Multiple technologies explain the input equally well:");
            for candidate in &candidates {
                eprintln!("  {candidate}: {}", candidate.ordered_files(&files).join(" "));
            }
            anyhow::bail!("Ambiguous technology ({} candidates)", candidates.len())
        }
        ClassificationOutcome::Unidentified => {
            print_failure(&registry, &files, &classification.reports);
            anyhow::bail!("Failed to identify the technology of the input files")
        }
    }
}

fn print_result(
    hypothesis: &Hypothesis<'_>,
    files: &[String],
    reports: &[ScoreReport],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let technology = hypothesis.technology;
    let ordered = hypothesis.ordered_files(files);

    match format {
        OutputFormat::Text => {
            println!("Technology: {} ({})", technology.name, technology.description);
            println!("File order: {}", hypothesis.permutation);
            for (i, file) in ordered.iter().enumerate() {
                let role = if i == technology.sequence.stream {
                    "sequence"
                } else {
                    "barcode/UMI"
                };
                println!("  {}. {file} ({role})", i + 1);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "technology": technology.name,
                "description": technology.description,
                "permutation": hypothesis.permutation,
                "files": ordered,
                "scores": reports,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("technology\tpermutation\tfiles");
            println!(
                "{}\t{}\t{}",
                technology.name,
                hypothesis.permutation,
                ordered.join(",")
            );
        }
    }
    Ok(())
}

fn print_failure(registry: &TechnologyRegistry, files: &[String], reports: &[ScoreReport]) {
    eprintln!("No technology explains the input files.");
    if reports.is_empty() {
        eprintln!(
            "Every layout accepting {} files needs longer reads than were sampled.",
            files.len()
        );
    } else {
        eprintln!("Scored layouts:");
        for report in reports {
            eprintln!("  {report}");
        }
    }

    let accepted: Vec<&str> = registry
        .technologies()
        .iter()
        .filter(|t| t.file_count == files.len())
        .map(|t| t.name.as_str())
        .collect();
    eprintln!("Technologies tried: {}", accepted.join(", "));
}
