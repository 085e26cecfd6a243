//! Opening local or remote inputs.
//!
//! Locations starting with `http://` or `https://` are fetched with a
//! blocking `reqwest` client and streamed; everything else is a local path.
//! Text inputs ending in `.gz` or `.bgz` are decompressed on the fly with a
//! multi-member gzip decoder, so concatenated gzip files read as one stream.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to open {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {location}: {source}")]
    Remote {
        location: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Whether a location refers to a remote resource
#[must_use]
pub fn is_remote(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Whether a location is gzip compressed, judged by extension
#[must_use]
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.ends_with(".gz") || lower.ends_with(".bgz")
}

/// Open a location as a raw byte stream, without decompression
pub fn open_raw(location: &str) -> Result<Box<dyn Read + Send>, InputError> {
    if is_remote(location) {
        debug!(%location, "Fetching remote input");
        let response = reqwest::blocking::get(location)
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|source| InputError::Remote {
                location: location.to_string(),
                source,
            })?;
        return Ok(Box::new(response));
    }

    let file = File::open(Path::new(location)).map_err(|source| InputError::Open {
        location: location.to_string(),
        source,
    })?;
    Ok(Box::new(file))
}

/// Open a location as buffered text, decompressing gzip inputs
pub fn open_input(location: &str) -> Result<Box<dyn BufRead + Send>, InputError> {
    let raw = open_raw(location)?;
    if is_gzipped(location) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(raw))))
    } else {
        Ok(Box::new(BufReader::new(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/R1.fastq.gz"));
        assert!(is_remote("HTTP://example.org/sample.bam"));
        assert!(!is_remote("/data/R1.fastq.gz"));
        assert!(!is_remote("R1.fastq"));
    }

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped("R1.fastq.gz"));
        assert!(is_gzipped("R1.FASTQ.GZ"));
        assert!(!is_gzipped("R1.fastq"));
    }

    #[test]
    fn test_open_input_reads_concatenated_gzip_members() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multi.txt.gz");

        let mut bytes = Vec::new();
        for chunk in [&b"first\n"[..], &b"second\n"[..]] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(chunk).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&path, bytes).unwrap();

        let reader = open_input(&path.to_string_lossy()).unwrap();
        let lines: Vec<String> = reader.lines().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_open_missing_file() {
        let err = open_input("/nonexistent/path/R1.fastq").err().unwrap();
        assert!(matches!(err, InputError::Open { .. }));
    }
}
