use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, trace};

use crate::core::hypothesis::Hypothesis;
use crate::core::sample::ReadSample;
use crate::core::technology::RegionRole;
use crate::core::types::Permutation;

/// Barcodes and UMIs extracted for one hypothesis, one entry per sampled read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRecords {
    /// Concatenated barcode regions, in sample order
    pub barcodes: Vec<String>,

    /// Concatenated UMI regions, in sample order
    pub umis: Vec<String>,
}

impl ExtractedRecords {
    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }
}

/// Result of running every hypothesis over a read sample
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Technology name -> permutation -> extracted sequences, for surviving hypotheses
    pub records: HashMap<String, BTreeMap<Permutation, ExtractedRecords>>,

    /// Technology name -> permutations whose layout did not fit the reads
    pub invalidated: HashMap<String, BTreeSet<Permutation>>,
}

impl Extraction {
    /// Extracted sequences for a hypothesis, `None` if it was invalidated
    pub fn records_for(&self, hypothesis: &Hypothesis<'_>) -> Option<&ExtractedRecords> {
        self.records
            .get(&hypothesis.technology.name)
            .and_then(|by_perm| by_perm.get(&hypothesis.permutation))
    }

    pub fn is_invalidated(&self, hypothesis: &Hypothesis<'_>) -> bool {
        self.invalidated
            .get(&hypothesis.technology.name)
            .is_some_and(|perms| perms.contains(&hypothesis.permutation))
    }

    /// Hypotheses, in their original order, that survived extraction
    pub fn surviving<'h, 'a>(
        &'h self,
        hypotheses: &'h [Hypothesis<'a>],
    ) -> impl Iterator<Item = (&'h Hypothesis<'a>, &'h ExtractedRecords)> + 'h {
        hypotheses
            .iter()
            .filter_map(move |h| self.records_for(h).map(|records| (h, records)))
    }

    fn invalidate(&mut self, hypothesis: &Hypothesis<'_>) {
        let name = &hypothesis.technology.name;
        if let Some(by_perm) = self.records.get_mut(name) {
            by_perm.remove(&hypothesis.permutation);
        }
        self.invalidated
            .entry(name.clone())
            .or_default()
            .insert(hypothesis.permutation.clone());
    }
}

/// Extract barcode and UMI sequences for every hypothesis.
///
/// Reads are visited by position across all files, stopping at the shortest
/// file. A hypothesis is invalidated the first time a sampled read is too
/// short for one of its barcode or UMI regions (or the region refers to a
/// file that was not supplied); everything extracted for it so far is
/// discarded and it is skipped for the remaining positions. Every technology
/// named by a hypothesis gets an entry in both output maps.
pub fn extract(sample: &ReadSample, hypotheses: &[Hypothesis<'_>]) -> Extraction {
    let mut extraction = Extraction::default();
    for hypothesis in hypotheses {
        let name = &hypothesis.technology.name;
        extraction
            .records
            .entry(name.clone())
            .or_default()
            .insert(hypothesis.permutation.clone(), ExtractedRecords::default());
        extraction.invalidated.entry(name.clone()).or_default();
    }

    let mut valid = vec![true; hypotheses.len()];
    for position in 0..sample.len() {
        for (hypothesis, is_valid) in hypotheses.iter().zip(valid.iter_mut()) {
            if !*is_valid {
                continue;
            }

            match extract_one(sample, position, hypothesis) {
                Some((barcode, umi)) => {
                    if let Some(records) = extraction
                        .records
                        .get_mut(&hypothesis.technology.name)
                        .and_then(|by_perm| by_perm.get_mut(&hypothesis.permutation))
                    {
                        records.barcodes.push(barcode);
                        records.umis.push(umi);
                    }
                }
                None => {
                    trace!(%hypothesis, position, "Read too short for layout");
                    *is_valid = false;
                    extraction.invalidate(hypothesis);
                }
            }
        }
    }

    debug!(
        hypotheses = hypotheses.len(),
        surviving = valid.iter().filter(|v| **v).count(),
        reads = sample.len(),
        "Extracted barcodes and UMIs"
    );
    extraction
}

/// Barcode and UMI of one read position, `None` if the layout does not fit
fn extract_one(
    sample: &ReadSample,
    position: usize,
    hypothesis: &Hypothesis<'_>,
) -> Option<(String, String)> {
    let technology = hypothesis.technology;
    let mut barcode = String::with_capacity(technology.barcode_length());
    let mut umi = String::with_capacity(technology.umi_length());

    for (role, region) in technology.extraction_regions() {
        if region.stream >= hypothesis.permutation.len() {
            return None;
        }
        let file = hypothesis.permutation.file_for(region.stream);
        if file >= sample.file_count() {
            return None;
        }

        let read = &sample.reads(file)[position];
        if !region.fits(read.len()) {
            return None;
        }

        let target = match role {
            RegionRole::Barcode => &mut barcode,
            RegionRole::Umi => &mut umi,
        };
        target.push_str(region.slice(read));
    }

    Some((barcode, umi))
}
