use crate::core::record::CombinedRecord;
use crate::core::technology::Technology;
use crate::core::types::{AlignmentTags, ReadSubstring, TagPair};
use crate::demux::pipeline::PipelineError;

/// Base written where a barcode or UMI tag is missing
pub const PLACEHOLDER_BASE: u8 = b'N';

/// Quality written where a barcode or UMI tag is missing (phred 0)
pub const PLACEHOLDER_QUALITY: u8 = b'!';

/// One reconstructed read for one output role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRead {
    pub sequence: Vec<u8>,
    pub qualities: Vec<u8>,
}

impl RoleRead {
    fn placeholder(length: usize) -> Self {
        Self {
            sequence: vec![PLACEHOLDER_BASE; length],
            qualities: vec![PLACEHOLDER_QUALITY; length],
        }
    }
}

/// How a combined record is split back into one read per input file of a
/// technology.
///
/// Barcode and UMI roles have a fixed length: the furthest bounded stop of
/// any region in that stream. The sequence role takes the record's own
/// sequence and qualities.
#[derive(Debug, Clone)]
pub struct ReadLayout<'t> {
    technology: &'t Technology,
    tags: &'t AlignmentTags,
    lengths: Vec<usize>,
}

impl<'t> ReadLayout<'t> {
    /// Build the layout for a technology that can be split from alignment tags
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotSplittable` if the technology declares no
    /// alignment tags.
    pub fn new(technology: &'t Technology) -> Result<Self, PipelineError> {
        let tags = technology
            .alignment_tags
            .as_ref()
            .ok_or_else(|| PipelineError::NotSplittable(technology.name.clone()))?;

        let mut lengths = vec![0; technology.file_count];
        for (_, region) in technology.extraction_regions() {
            if let (Some(stop), Some(length)) = (region.stop, lengths.get_mut(region.stream)) {
                *length = (*length).max(stop);
            }
        }

        Ok(Self {
            technology,
            tags,
            lengths,
        })
    }

    #[must_use]
    pub fn technology(&self) -> &'t Technology {
        self.technology
    }

    /// Number of output roles (one per input file of the technology)
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.lengths.len()
    }

    /// Fixed read length of a role; the sequence role reports 0
    #[must_use]
    pub fn role_length(&self, role: usize) -> usize {
        if role == self.technology.sequence.stream {
            0
        } else {
            self.lengths[role]
        }
    }

    /// Tags that must be decoded from each record
    #[must_use]
    pub fn tag_names(&self) -> [&'t str; 4] {
        self.tags.names()
    }

    /// Rebuild one read per role from a combined record.
    ///
    /// The returned flag is false when a barcode or UMI tag was missing or did
    /// not match the technology's total length; those roles keep their
    /// placeholders.
    #[must_use]
    pub fn reconstruct(&self, record: &CombinedRecord) -> (Vec<RoleRead>, bool) {
        let mut reads: Vec<RoleRead> = self
            .lengths
            .iter()
            .map(|&length| RoleRead::placeholder(length))
            .collect();

        if let Some(read) = reads.get_mut(self.technology.sequence.stream) {
            read.sequence.clone_from(&record.sequence);
            read.qualities.clone_from(&record.qualities);
        }

        let barcode = fill_regions(&mut reads, record, &self.tags.barcode, &self.technology.barcode);
        let umi = fill_regions(&mut reads, record, &self.tags.umi, &self.technology.umi);
        (reads, barcode && umi)
    }
}

/// Split a tag's sequence and quality across `regions` in declaration order
fn fill_regions(
    reads: &mut [RoleRead],
    record: &CombinedRecord,
    tags: &TagPair,
    regions: &[ReadSubstring],
) -> bool {
    let (Some(sequence), Some(qualities)) = (record.tag(&tags.sequence), record.tag(&tags.quality))
    else {
        return false;
    };
    let total: usize = regions.iter().filter_map(ReadSubstring::len).sum();
    if sequence.len() != total || qualities.len() != total {
        return false;
    }

    let (sequence, qualities) = (sequence.as_bytes(), qualities.as_bytes());
    let mut offset = 0;
    for region in regions {
        let Some(length) = region.len() else {
            continue;
        };
        let source = offset..offset + length;
        offset += length;

        let target = region.start..region.start + length;
        let Some(read) = reads.get_mut(region.stream) else {
            continue;
        };
        if read.sequence.len() < target.end {
            continue;
        }
        read.sequence[target.clone()].copy_from_slice(&sequence[source.clone()]);
        read.qualities[target].copy_from_slice(&qualities[source]);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::TechnologyRegistry;

    fn tenx_record(barcode: &str, umi: &str) -> CombinedRecord {
        CombinedRecord::new("read1", b"ACGTACGT".to_vec(), b"FFFF::::".to_vec())
            .with_tag("CR", barcode)
            .with_tag("CY", "F".repeat(barcode.len()))
            .with_tag("UR", umi)
            .with_tag("UY", "#".repeat(umi.len()))
    }

    #[test]
    fn test_tenx_v2_layout() {
        let registry = TechnologyRegistry::embedded();
        let layout = ReadLayout::new(registry.get("10xv2").unwrap()).unwrap();
        assert_eq!(layout.role_count(), 2);
        assert_eq!(layout.role_length(0), 26);
        assert_eq!(layout.role_length(1), 0);

        let (reads, complete) = layout.reconstruct(&tenx_record(&"A".repeat(16), &"C".repeat(10)));
        assert!(complete);
        assert_eq!(reads[0].sequence, format!("{}{}", "A".repeat(16), "C".repeat(10)).into_bytes());
        assert_eq!(reads[0].qualities, format!("{}{}", "F".repeat(16), "#".repeat(10)).into_bytes());
        assert_eq!(reads[1].sequence, b"ACGTACGT");
        assert_eq!(reads[1].qualities, b"FFFF::::");
    }

    #[test]
    fn test_tenx_v1_layout_spreads_over_three_roles() {
        let registry = TechnologyRegistry::embedded();
        let layout = ReadLayout::new(registry.get("10xv1").unwrap()).unwrap();
        assert_eq!(layout.role_count(), 3);

        let (reads, complete) = layout.reconstruct(&tenx_record(&"G".repeat(14), &"T".repeat(10)));
        assert!(complete);
        assert_eq!(reads[0].sequence, "G".repeat(14).into_bytes());
        assert_eq!(reads[1].sequence, "T".repeat(10).into_bytes());
        assert_eq!(reads[2].sequence, b"ACGTACGT");
    }

    #[test]
    fn test_missing_tag_keeps_placeholders() {
        let registry = TechnologyRegistry::embedded();
        let layout = ReadLayout::new(registry.get("10xv2").unwrap()).unwrap();
        let record = CombinedRecord::new("read1", b"ACGT".to_vec(), b"FFFF".to_vec())
            .with_tag("CR", "A".repeat(16))
            .with_tag("CY", "F".repeat(16));

        let (reads, complete) = layout.reconstruct(&record);
        assert!(!complete);
        assert_eq!(&reads[0].sequence[..16], "A".repeat(16).as_bytes());
        assert_eq!(&reads[0].sequence[16..], "N".repeat(10).as_bytes());
        assert_eq!(&reads[0].qualities[16..], "!".repeat(10).as_bytes());
    }

    #[test]
    fn test_wrong_tag_length_is_incomplete() {
        let registry = TechnologyRegistry::embedded();
        let layout = ReadLayout::new(registry.get("10xv2").unwrap()).unwrap();
        let (reads, complete) = layout.reconstruct(&tenx_record("AAAA", &"C".repeat(10)));
        assert!(!complete);
        assert_eq!(&reads[0].sequence[..16], "N".repeat(16).as_bytes());
    }

    #[test]
    fn test_technology_without_tags() {
        let registry = TechnologyRegistry::embedded();
        let result = ReadLayout::new(registry.get("dropseq").unwrap());
        assert!(matches!(result, Err(PipelineError::NotSplittable(name)) if name == "dropseq"));
    }
}
