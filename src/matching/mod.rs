//! Hypothesis enumeration, barcode extraction and classification.
//!
//! Identifying the technology of a set of read files runs in three steps:
//!
//! 1. [`enumerate`](enumerate::enumerate): every (technology, permutation)
//!    pair that accepts the number of input files
//! 2. [`extract`](extraction::extract): barcodes and UMIs for each hypothesis
//!    over a sample of reads, dropping hypotheses whose layout does not fit
//! 3. [`Classifier`](engine::Classifier): picks the surviving hypothesis that
//!    best explains the sample
//!
//! ## Classification
//!
//! Two tiers are evaluated in order:
//!
//! - **Whitelist**: for technologies with a loadable whitelist, the number of
//!   sampled barcodes found in it. Candidates need more than
//!   `sample_size * barcode_threshold` matches; the highest count wins.
//! - **Uniform model**: for all other technologies, the deficit of observed
//!   unique barcodes relative to uniformly random sequence of the same length.
//!   Real barcodes repeat, so the largest positive deficit wins. Equal deficits
//!   are returned together and reported as ambiguous.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tech_solver::{Classifier, ClassifierConfig, TechnologyRegistry};
//! use tech_solver::matching::{enumerate::enumerate, extraction::extract};
//! use tech_solver::parsing::fastq::sample_files;
//!
//! let files = vec!["R1.fastq.gz".to_string(), "R2.fastq.gz".to_string()];
//! let sample = sample_files(&files, 1000, 100_000).unwrap();
//!
//! let registry = TechnologyRegistry::embedded();
//! let hypotheses = enumerate(files.len(), registry.technologies());
//! let extraction = extract(&sample, &hypotheses);
//!
//! let mut classifier = Classifier::new(ClassifierConfig::default());
//! for hypothesis in classifier.classify(&extraction, sample.len(), &hypotheses) {
//!     println!("{hypothesis}");
//! }
//! ```

pub mod engine;
pub mod enumerate;
pub mod extraction;
pub mod scoring;
