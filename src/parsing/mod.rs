//! Readers for the inputs technology detection works on.
//!
//! - **FASTQ files**: sample a window of sequences from each read file
//! - **BAM files**: stream primary records with their barcode/UMI tags
//! - **Locations**: local paths or `http(s)://` URLs, optionally gzipped
//!
//! ## Example
//!
//! ```rust,no_run
//! use tech_solver::parsing::fastq::sample_files;
//!
//! let files = vec!["R1.fastq.gz".to_string(), "R2.fastq.gz".to_string()];
//! // Skip the first 1000 reads and keep the next 10000 from each file
//! let sample = sample_files(&files, 1000, 10_000).unwrap();
//! assert_eq!(sample.file_count(), 2);
//! ```
//!
//! ## Alignment tags
//!
//! Combined files carry the barcode and UMI reads as string tags. For 10x:
//!
//! | Tag | Description |
//! |-----|-------------|
//! | CR  | Uncorrected cell barcode |
//! | CY  | Cell barcode qualities |
//! | UR  | Uncorrected UMI |
//! | UY  | UMI qualities |

pub mod bam;
pub mod fastq;
pub mod input;
