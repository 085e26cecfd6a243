//! Sampling reads from FASTQ files using noodles.
//!
//! Only the sequence line of each record is kept. Inputs may be plain or
//! gzip-compressed, local or remote (see [`crate::parsing::input`]).

use noodles::fastq;
use tracing::debug;

use crate::core::sample::ReadSample;
use crate::parsing::bam::ParseError;
use crate::parsing::input::open_input;

/// Check if the location has a FASTQ extension
#[must_use]
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_fastq_file(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    [".fastq", ".fq", ".fastq.gz", ".fq.gz"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

/// Read up to `count` sequences after skipping the first `skip` records.
///
/// Sequences are uppercased; bytes outside ASCII become `N`.
///
/// # Errors
///
/// Returns `ParseError::Input` if the location cannot be opened, or
/// `ParseError::InvalidFastq` if a record cannot be parsed.
pub fn sample_reads(location: &str, skip: usize, count: usize) -> Result<Vec<String>, ParseError> {
    let mut reader = fastq::io::Reader::new(open_input(location)?);

    let mut reads = Vec::with_capacity(count.min(1 << 20));
    for result in reader.records().skip(skip).take(count) {
        let record = result.map_err(|e| ParseError::InvalidFastq {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
        reads.push(normalize_sequence(record.sequence()));
    }

    debug!(%location, skip, sampled = reads.len(), "Sampled reads");
    Ok(reads)
}

/// Sample every input file with the same window
///
/// # Errors
///
/// Returns the first error encountered while sampling any file.
pub fn sample_files(locations: &[String], skip: usize, count: usize) -> Result<ReadSample, ParseError> {
    let mut sample = ReadSample::new();
    for location in locations {
        sample.push(location.clone(), sample_reads(location, skip, count)?);
    }
    Ok(sample)
}

fn normalize_sequence(sequence: &[u8]) -> String {
    sequence
        .iter()
        .map(|&b| {
            if b.is_ascii() {
                char::from(b.to_ascii_uppercase())
            } else {
                'N'
            }
        })
        .collect()
}
