//! Barcode whitelists for whitelist-backed technologies.
//!
//! A whitelist is a newline-delimited list of valid barcodes, optionally
//! gzip-compressed, found at `{whitelist_dir}/{technology.whitelist}`.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::technology::Technology;
use crate::parsing::input::{open_input, InputError};

#[derive(Error, Debug)]
pub enum WhitelistError {
    #[error("Technology {0} has no whitelist")]
    NotConfigured(String),

    #[error("No whitelist directory configured for {0} (--whitelist-dir or TECH_SOLVER_WHITELIST_DIR)")]
    NoDirectory(String),

    #[error("Whitelist not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read whitelist {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Set of valid barcodes for one technology
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    barcodes: HashSet<String>,
}

impl Whitelist {
    /// Read a whitelist from a (possibly gzipped) file
    pub fn load(path: &Path) -> Result<Self, WhitelistError> {
        if !path.exists() {
            return Err(WhitelistError::NotFound(path.to_path_buf()));
        }

        let reader = open_input(&path.to_string_lossy())?;
        let mut barcodes = HashSet::new();
        for line in reader.lines() {
            let line = line.map_err(|source| WhitelistError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let barcode = line.trim();
            if !barcode.is_empty() {
                barcodes.insert(barcode.to_ascii_uppercase());
            }
        }

        debug!(path = %path.display(), barcodes = barcodes.len(), "Loaded whitelist");
        Ok(Self { barcodes })
    }

    /// Load the whitelist for `technology` from `dir`
    pub fn for_technology(
        technology: &Technology,
        dir: Option<&Path>,
    ) -> Result<Self, WhitelistError> {
        let file = technology
            .whitelist
            .as_ref()
            .ok_or_else(|| WhitelistError::NotConfigured(technology.name.clone()))?;
        let dir = dir.ok_or_else(|| WhitelistError::NoDirectory(technology.name.clone()))?;
        Self::load(&dir.join(file))
    }

    #[must_use]
    pub fn contains(&self, barcode: &str) -> bool {
        self.barcodes.contains(barcode)
    }

    /// Count how many of `barcodes` are in the whitelist
    pub fn count_matches<'b>(&self, barcodes: impl IntoIterator<Item = &'b String>) -> usize {
        barcodes
            .into_iter()
            .filter(|barcode| self.contains(barcode))
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

impl FromIterator<String> for Whitelist {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            barcodes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ReadSubstring;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn tech_with_whitelist(file: &str) -> Technology {
        Technology::new("t", "test", 2, ReadSubstring::new(1, 0, None))
            .with_barcode(vec![ReadSubstring::new(0, 0, Some(4))])
            .with_whitelist(file)
    }

    #[test]
    fn test_load_plain_whitelist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wl.txt"), "AAAA\ncccc\n\nGGGG\n").unwrap();

        let whitelist =
            Whitelist::for_technology(&tech_with_whitelist("wl.txt"), Some(dir.path())).unwrap();
        assert_eq!(whitelist.len(), 3);
        assert!(whitelist.contains("CCCC"));
        assert!(!whitelist.contains("TTTT"));
    }

    #[test]
    fn test_load_gzip_whitelist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wl.txt.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"ACGT\nTGCA\n").unwrap();
        encoder.finish().unwrap();

        let whitelist = Whitelist::load(&path).unwrap();
        assert_eq!(whitelist.len(), 2);
        let sample = vec!["ACGT".to_string(), "ACGT".to_string(), "NNNN".to_string()];
        assert_eq!(whitelist.count_matches(&sample), 2);
    }

    #[test]
    fn test_missing_whitelist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Whitelist::for_technology(&tech_with_whitelist("absent.txt"), Some(dir.path()))
            .unwrap_err();
        assert!(matches!(err, WhitelistError::NotFound(_)));

        let err = Whitelist::for_technology(&tech_with_whitelist("wl.txt"), None).unwrap_err();
        assert!(matches!(err, WhitelistError::NoDirectory(_)));
    }

    #[test]
    fn test_technology_without_whitelist() {
        let tech = Technology::new("t", "test", 1, ReadSubstring::new(0, 0, None));
        let err = Whitelist::for_technology(&tech, None).unwrap_err();
        assert!(matches!(err, WhitelistError::NotConfigured(_)));
    }
}
