//! # tech-solver
//!
//! A library for identifying the single-cell sequencing technology of a set
//! of read files.
//!
//! Single-cell protocols spread the cell barcode, the UMI and the cDNA insert
//! over several read files, and files from public archives rarely say which
//! protocol produced them or which file is which. `tech-solver` tries every
//! known technology in every file order and keeps the layout whose barcodes
//! look real.
//!
//! ## Features
//!
//! - **Whitelist matching**: Counts sampled barcodes found in a technology's whitelist
//! - **Uniform-model fallback**: Without a whitelist, real barcodes repeat far
//!   more than random sequence would
//! - **File order detection**: Reports the input files in the technology's order
//! - **BAM splitting**: Rebuilds per-file FASTQs from 10x BAM tags
//!
//! ## Example
//!
//! ```rust,no_run
//! use tech_solver::{Classifier, ClassifierConfig, TechnologyRegistry};
//! use tech_solver::matching::{enumerate::enumerate, extraction::extract};
//! use tech_solver::parsing::fastq::sample_files;
//!
//! let files = vec!["R2.fastq.gz".to_string(), "R1.fastq.gz".to_string()];
//! let sample = sample_files(&files, 1000, 100_000).unwrap();
//!
//! let registry = TechnologyRegistry::embedded();
//! let hypotheses = enumerate(files.len(), registry.technologies());
//! let extraction = extract(&sample, &hypotheses);
//!
//! let mut classifier = Classifier::new(ClassifierConfig::default());
//! if let [hypothesis] = classifier.classify(&extraction, sample.len(), &hypotheses).as_slice() {
//!     println!("{}: {:?}", hypothesis.technology.name, hypothesis.ordered_files(&files));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Technology registry and barcode whitelists
//! - [`core`]: Core data types for technologies, hypotheses and records
//! - [`matching`]: Hypothesis enumeration, extraction and classification
//! - [`parsing`]: FASTQ sampling and BAM record decoding
//! - [`demux`]: Splitting combined BAMs into per-file FASTQs
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod demux;
pub mod matching;
pub mod parsing;

// Re-export commonly used types for convenience
pub use catalog::store::TechnologyRegistry;
pub use core::hypothesis::Hypothesis;
pub use core::technology::Technology;
pub use core::types::*;
pub use matching::engine::{ClassificationOutcome, Classifier, ClassifierConfig};
