//! Splitting a combined alignment file back into per-file FASTQs.
//!
//! Technologies that carry their barcode and UMI reads as alignment tags
//! (10x: `CR`/`CY`, `UR`/`UY`) can be rebuilt into the FASTQ files the
//! sequencer produced. Each output role gets a fixed-length read with the
//! tag values written into the technology's barcode and UMI regions; the
//! sequence role gets the aligned read itself.
//!
//! - [`layout`]: rebuilding per-role reads from one record
//! - [`shard`]: per-worker gzip shards and their merge
//! - [`pipeline`]: the bounded producer/worker pipeline
//!
//! ## Example
//!
//! ```rust,no_run
//! use tech_solver::TechnologyRegistry;
//! use tech_solver::demux::pipeline::{split_bam, SplitConfig};
//!
//! let registry = TechnologyRegistry::embedded();
//! let technology = registry.get("10xv2").unwrap();
//! let summary = split_bam("possorted_genome.bam", technology, SplitConfig::default()).unwrap();
//! for output in &summary.outputs {
//!     println!("{}", output.display());
//! }
//! ```

pub mod layout;
pub mod pipeline;
pub mod shard;
