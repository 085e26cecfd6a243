//! Core data types for single-cell technology detection.
//!
//! - [`ReadSubstring`](types::ReadSubstring): a byte range within one logical read
//! - [`Technology`](technology::Technology): a named read layout from the registry
//! - [`Permutation`](types::Permutation): which input file fills each logical stream
//! - [`Hypothesis`](hypothesis::Hypothesis): a (technology, permutation) candidate
//! - [`ReadSample`](sample::ReadSample): the reads sampled from each input file
//! - [`CombinedRecord`](record::CombinedRecord): one record of a combined alignment file
//!
//! ## Layouts
//!
//! | Technology | Files | Barcode | UMI | Sequence |
//! |------------|-------|---------|-----|----------|
//! | 10xv2      | 2     | 0:0-16  | 0:16-26 | 1 |
//! | 10xv3      | 2     | 0:0-16  | 0:16-28 | 1 |
//! | 10xv1      | 3     | 0:0-14  | 1:0-10  | 2 |
//!
//! Ranges are written `stream:start-stop` and are half-open.

pub mod hypothesis;
pub mod record;
pub mod sample;
pub mod technology;
pub mod types;
