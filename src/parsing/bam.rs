//! Combined alignment (BAM) input.
//!
//! The BAM container itself is decoded by `noodles`; this module turns its
//! records into [`CombinedRecord`]s carrying only what the splitter needs,
//! and detects the technology from the barcode/UMI tags of the first usable
//! record.

use noodles::bam;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use thiserror::Error;
use tracing::debug;

use crate::catalog::store::TechnologyRegistry;
use crate::core::record::CombinedRecord;
use crate::core::technology::Technology;
use crate::parsing::input::{open_raw, InputError};

/// Number of records inspected when looking for technology tags
pub const DETECTION_SCAN_LIMIT: usize = 10_000;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Invalid FASTQ record in {location}: {reason}")]
    InvalidFastq { location: String, reason: String },

    #[error("No known technology matches {location}: {reason}")]
    UnknownTechnology { location: String, reason: String },
}

/// Check if the location has a BAM extension
#[must_use]
pub fn is_bam_file(location: &str) -> bool {
    location.to_ascii_lowercase().ends_with(".bam")
}

/// Iterator over the primary records of a combined file
pub type RecordIter<'a> = dyn Iterator<Item = Result<CombinedRecord, ParseError>> + 'a;

/// Open a BAM and hand its primary records to `f`.
///
/// Only the tags listed in `tags` are decoded. Secondary and supplementary
/// alignments are skipped so every read is seen once.
///
/// # Errors
///
/// Returns `ParseError::Input` if the location cannot be opened and
/// `ParseError::Noodles` if the header cannot be read. Record-level errors
/// are yielded by the iterator.
pub fn with_records<T, F>(location: &str, tags: &[&str], f: F) -> Result<T, ParseError>
where
    F: FnOnce(&mut RecordIter<'_>) -> T,
{
    let wanted: Vec<(Tag, &str)> = tags
        .iter()
        .filter_map(|&name| to_tag(name).map(|tag| (tag, name)))
        .collect();

    let mut reader = bam::io::Reader::new(open_raw(location)?);
    reader
        .read_header()
        .map_err(|e| ParseError::Noodles(e.to_string()))?;

    let mut records = reader
        .records()
        .filter(|result| result.as_ref().map_or(true, is_primary))
        .map(|result| {
            result
                .map_err(ParseError::from)
                .map(|record| convert_record(&record, &wanted))
        });

    Ok(f(&mut records))
}

/// Detect the technology of a combined file from its tags.
///
/// # Errors
///
/// Returns `ParseError::UnknownTechnology` if no record within
/// [`DETECTION_SCAN_LIMIT`] carries a complete tag set, or if the tag
/// lengths match no registered technology.
pub fn detect_technology<'r>(
    location: &str,
    registry: &'r TechnologyRegistry,
) -> Result<&'r Technology, ParseError> {
    let mut tag_names: Vec<&str> = registry
        .technologies()
        .iter()
        .filter_map(|t| t.alignment_tags.as_ref())
        .flat_map(|tags| tags.names())
        .collect();
    tag_names.sort_unstable();
    tag_names.dedup();

    let detected = with_records(location, &tag_names, |records| {
        for result in records.take(DETECTION_SCAN_LIMIT) {
            let record = result?;
            if let Some(outcome) = detect_from_record(&record, registry.technologies()) {
                return Ok(Some(outcome));
            }
        }
        Ok::<_, ParseError>(None)
    })??;

    match detected {
        Some(Ok(technology)) => {
            debug!(%location, technology = %technology.name, "Detected technology from tags");
            Ok(technology)
        }
        Some(Err(reason)) => Err(ParseError::UnknownTechnology {
            location: location.to_string(),
            reason,
        }),
        None => Err(ParseError::UnknownTechnology {
            location: location.to_string(),
            reason: format!(
                "no record among the first {DETECTION_SCAN_LIMIT} carries barcode and UMI tags"
            ),
        }),
    }
}

/// Match a record's tag lengths against technologies that declare tags.
///
/// Returns `None` when the record carries no complete tag set,
/// `Some(Err(reason))` when it does but the lengths match nothing.
pub fn detect_from_record<'r>(
    record: &CombinedRecord,
    technologies: &'r [Technology],
) -> Option<Result<&'r Technology, String>> {
    let mut observed = None;

    for technology in technologies {
        let Some(tags) = &technology.alignment_tags else {
            continue;
        };
        if !record.has_tags(tags.names()) {
            continue;
        }

        let barcode_length = record.tag(&tags.barcode.sequence).map_or(0, str::len);
        let umi_length = record.tag(&tags.umi.sequence).map_or(0, str::len);
        if barcode_length == technology.barcode_length() && umi_length == technology.umi_length()
        {
            return Some(Ok(technology));
        }
        observed = Some((barcode_length, umi_length));
    }

    observed.map(|(barcode_length, umi_length)| {
        Err(format!(
            "no technology has barcode length {barcode_length} and UMI length {umi_length}"
        ))
    })
}

fn to_tag(name: &str) -> Option<Tag> {
    match name.as_bytes() {
        &[a, b] => Some(Tag::new(a, b)),
        _ => None,
    }
}

fn is_primary(record: &bam::Record) -> bool {
    let flags = record.flags();
    !flags.is_secondary() && !flags.is_supplementary()
}

fn convert_record(record: &bam::Record, wanted: &[(Tag, &str)]) -> CombinedRecord {
    let name = record.name().map(|n| n.to_string()).unwrap_or_default();
    let sequence: Vec<u8> = record
        .sequence()
        .iter()
        .map(|base| base.to_ascii_uppercase())
        .collect();
    let qualities: Vec<u8> = record
        .quality_scores()
        .as_ref()
        .iter()
        .copied()
        .map(phred_to_ascii)
        .collect();

    let mut converted = CombinedRecord::new(name, sequence, qualities);

    let data = record.data();
    for (tag, tag_name) in wanted {
        let value = match data.get(tag) {
            Some(Ok(Value::String(s))) => s.to_string(),
            Some(Ok(Value::Character(c))) => char::from(c).to_string(),
            _ => continue,
        };
        converted.insert_tag(tag_name, value);
    }

    converted
}

/// Encode a raw phred score as phred+33, mapping the "missing" marker to the
/// lowest quality
fn phred_to_ascii(score: u8) -> u8 {
    if score > 93 {
        b'!'
    } else {
        score + 33
    }
}
