//! Command-line interface for tech-solver.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **identify**: Identify the technology and file order of read files, or of
//!   a combined BAM after splitting it
//! - **split**: Split a combined BAM into per-file FASTQs
//! - **technologies**: List the technologies in the registry
//!
//! ## Usage
//!
//! ```text
//! # Identify technology from read files in any order
//! tech-solver identify R2.fastq.gz R1.fastq.gz
//!
//! # Use whitelists for 10x and inDrops
//! tech-solver identify R1.fastq.gz R2.fastq.gz --whitelist-dir whitelists/
//!
//! # Split a 10x BAM and identify the resulting files
//! tech-solver identify possorted_genome.bam -p sample -o fastqs/
//!
//! # JSON output for scripting
//! tech-solver identify R1.fastq.gz R2.fastq.gz --format json
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::catalog::store::TechnologyRegistry;
use crate::demux::pipeline::{SplitConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_THREADS};

pub mod identify;
pub mod split;
pub mod technologies;

#[derive(Parser)]
#[command(name = "tech-solver")]
#[command(version)]
#[command(about = "Identify the single-cell technology of sequencing read files")]
#[command(
    long_about = "tech-solver works out which single-cell protocol produced a set of read files and which file plays which role.\n\nIt tries every technology that accepts the number of input files, in every file order, and keeps the one whose barcodes:\n- Match the technology's barcode whitelist, when one is available\n- Otherwise repeat far more than random sequence would\n\nCombined 10x BAM files can be split back into per-file FASTQs first."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the technology and file order of read files or a combined BAM
    Identify(identify::IdentifyArgs),

    /// Split a combined BAM into one FASTQ per input file of its technology
    Split(split::SplitArgs),

    /// List the technologies in the registry
    Technologies(technologies::TechnologiesArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Options shared by every command that splits a combined BAM
#[derive(Args, Clone, Debug)]
pub struct SplitOptions {
    /// Prefix for output FASTQs ({prefix}_1.fastq.gz, ...)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Number of worker threads
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Number of records buffered between the reader and the workers
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Directory for output FASTQs
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Technology of the BAM (detected from its tags by default)
    #[arg(long)]
    pub technology: Option<String>,
}

impl SplitOptions {
    #[must_use]
    pub fn to_config(&self) -> SplitConfig {
        SplitConfig {
            threads: self.threads,
            queue_capacity: self.queue_capacity,
            prefix: self.prefix.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Load a custom registry, or the embedded one
///
/// # Errors
///
/// Returns an error if the registry file cannot be read or is invalid.
pub fn load_registry(path: Option<&Path>) -> anyhow::Result<TechnologyRegistry> {
    let registry = if let Some(path) = path {
        TechnologyRegistry::load_from_file(path)?
    } else {
        TechnologyRegistry::load_embedded()?
    };
    if registry.is_empty() {
        anyhow::bail!("Registry contains no technologies");
    }
    Ok(registry)
}
