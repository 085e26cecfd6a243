use serde::{Deserialize, Serialize};

use crate::core::types::{AlignmentTags, ReadSubstring};

/// A known single-cell technology layout in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    /// Unique short name (e.g. `10xv2`)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Number of read files the technology produces
    pub file_count: usize,

    /// Where the biological sequence lives
    pub sequence: ReadSubstring,

    /// UMI regions, concatenated in this order
    pub umi: Vec<ReadSubstring>,

    /// Barcode regions, concatenated in this order
    pub barcode: Vec<ReadSubstring>,

    /// File name of the barcode whitelist, relative to the whitelist directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,

    /// Tags carrying barcode and UMI reads in a combined alignment file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_tags: Option<AlignmentTags>,
}

impl Technology {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        file_count: usize,
        sequence: ReadSubstring,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            file_count,
            sequence,
            umi: Vec::new(),
            barcode: Vec::new(),
            whitelist: None,
            alignment_tags: None,
        }
    }

    #[must_use]
    pub fn with_umi(mut self, umi: Vec<ReadSubstring>) -> Self {
        self.umi = umi;
        self
    }

    #[must_use]
    pub fn with_barcode(mut self, barcode: Vec<ReadSubstring>) -> Self {
        self.barcode = barcode;
        self
    }

    #[must_use]
    pub fn with_whitelist(mut self, whitelist: impl Into<String>) -> Self {
        self.whitelist = Some(whitelist.into());
        self
    }

    #[must_use]
    pub fn with_alignment_tags(mut self, tags: AlignmentTags) -> Self {
        self.alignment_tags = Some(tags);
        self
    }

    /// Total number of barcode bases across all barcode regions
    #[must_use]
    pub fn barcode_length(&self) -> usize {
        self.barcode.iter().filter_map(ReadSubstring::len).sum()
    }

    /// Total number of UMI bases across all UMI regions
    #[must_use]
    pub fn umi_length(&self) -> usize {
        self.umi.iter().filter_map(ReadSubstring::len).sum()
    }

    #[must_use]
    pub fn has_whitelist(&self) -> bool {
        self.whitelist.is_some()
    }

    /// Barcode regions followed by UMI regions, the order extraction visits them
    pub fn extraction_regions(&self) -> impl Iterator<Item = (RegionRole, &ReadSubstring)> {
        self.barcode
            .iter()
            .map(|r| (RegionRole::Barcode, r))
            .chain(self.umi.iter().map(|r| (RegionRole::Umi, r)))
    }

    /// Check the layout invariants: every region lives in a declared stream,
    /// ranges are ordered, and barcode/UMI ranges are bounded.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.file_count == 0 {
            return Err(format!("{}: file_count must be at least 1", self.name));
        }

        let regions = std::iter::once(&self.sequence)
            .chain(&self.umi)
            .chain(&self.barcode);
        for region in regions {
            if region.stream >= self.file_count {
                return Err(format!(
                    "{}: region {region} refers to stream {} but file_count is {}",
                    self.name, region.stream, self.file_count
                ));
            }
            if let Some(stop) = region.stop {
                if region.start > stop {
                    return Err(format!("{}: region {region} has start > stop", self.name));
                }
            }
        }

        if let Some((role, region)) = self
            .extraction_regions()
            .find(|(_, region)| region.stop.is_none())
        {
            return Err(format!(
                "{}: {role} region {region} must have a bounded stop",
                self.name
            ));
        }

        if let Some(tags) = &self.alignment_tags {
            if let Some(bad) = tags.names().into_iter().find(|t| t.len() != 2 || !t.is_ascii()) {
                return Err(format!(
                    "{}: alignment tag '{bad}' must be two ASCII characters",
                    self.name
                ));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for Technology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Role a region plays in a read layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    Barcode,
    Umi,
}

impl std::fmt::Display for RegionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Barcode => write!(f, "barcode"),
            Self::Umi => write!(f, "UMI"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenx_v2() -> Technology {
        Technology::new("10xv2", "10x version 2", 2, ReadSubstring::new(1, 0, None))
            .with_umi(vec![ReadSubstring::new(0, 16, Some(26))])
            .with_barcode(vec![ReadSubstring::new(0, 0, Some(16))])
    }

    #[test]
    fn test_lengths() {
        let tech = tenx_v2();
        assert_eq!(tech.barcode_length(), 16);
        assert_eq!(tech.umi_length(), 10);
        assert!(tech.validate().is_ok());
    }

    #[test]
    fn test_extraction_regions_order() {
        let tech = tenx_v2();
        let roles: Vec<RegionRole> = tech.extraction_regions().map(|(role, _)| role).collect();
        assert_eq!(roles, vec![RegionRole::Barcode, RegionRole::Umi]);
    }

    #[test]
    fn test_validate_stream_out_of_range() {
        let tech = tenx_v2().with_umi(vec![ReadSubstring::new(2, 0, Some(10))]);
        let err = tech.validate().unwrap_err();
        assert!(err.contains("stream 2"));
    }

    #[test]
    fn test_validate_unbounded_barcode() {
        let tech = tenx_v2().with_barcode(vec![ReadSubstring::new(0, 0, None)]);
        assert!(tech.validate().is_err());
    }

    #[test]
    fn test_validate_reversed_range() {
        let tech = tenx_v2().with_barcode(vec![ReadSubstring::new(0, 10, Some(4))]);
        assert!(tech.validate().is_err());
    }
}
