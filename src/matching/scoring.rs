use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::whitelist::Whitelist;
use crate::core::hypothesis::Hypothesis;
use crate::core::types::Permutation;
use crate::matching::extraction::ExtractedRecords;

/// Safely convert usize to f64 for fraction and expectation calculations
///
/// Sample sizes and barcode lengths are far below the 2^53 limit of the f64
/// mantissa, so the conversion is exact in practice.
#[inline]
pub(crate) fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Which classification tier produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Barcodes counted against a known whitelist
    Whitelist,
    /// Observed unique barcodes compared to a uniform random model
    UniformModel,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Whitelist => write!(f, "whitelist"),
            Self::UniformModel => write!(f, "uniform-model"),
        }
    }
}

/// Expected number of distinct values when drawing `draws` times uniformly
/// from all barcodes of `barcode_length` bases.
///
/// This is `space * (1 - ((space - 1) / space)^draws)` with `space = 4^L`,
/// evaluated as `-space * expm1(draws * ln_1p(-1 / space))` so it stays
/// accurate when `space` is much larger than `draws`.
#[must_use]
pub fn expected_unique(barcode_length: usize, draws: usize) -> f64 {
    if draws == 0 {
        return 0.0;
    }
    let space = 4f64.powf(count_to_f64(barcode_length));
    if !space.is_finite() {
        // Every draw is distinct in an unbounded space
        return count_to_f64(draws);
    }
    -space * (count_to_f64(draws) * (-1.0 / space).ln_1p()).exp_m1()
}

/// Number of distinct barcodes in a sample
#[must_use]
pub fn unique_count(barcodes: &[String]) -> usize {
    barcodes.iter().collect::<HashSet<_>>().len()
}

/// Shortfall of observed unique barcodes relative to the uniform model.
///
/// Real barcodes repeat (many reads per cell), so the correct layout shows a
/// large positive deficit while a wrong layout samples near-random sequence.
#[must_use]
pub fn barcode_deficit(barcode_length: usize, barcodes: &[String]) -> f64 {
    expected_unique(barcode_length, barcodes.len()) - count_to_f64(unique_count(barcodes))
}

/// Score of one surviving hypothesis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub technology: String,
    pub permutation: Permutation,
    pub tier: Tier,

    /// Whitelist matches (whitelist tier) or deficit (uniform-model tier)
    pub score: f64,

    /// Number of sampled reads that were scored
    pub reads: usize,

    /// Whether the score made the hypothesis a candidate in its tier
    pub qualified: bool,
}

impl ScoreReport {
    /// Score a hypothesis against its technology's whitelist
    #[must_use]
    pub fn whitelist(
        hypothesis: &Hypothesis<'_>,
        records: &ExtractedRecords,
        whitelist: &Whitelist,
        min_matches: f64,
    ) -> Self {
        let matches = count_to_f64(whitelist.count_matches(&records.barcodes));
        Self {
            technology: hypothesis.technology.name.clone(),
            permutation: hypothesis.permutation.clone(),
            tier: Tier::Whitelist,
            score: matches,
            reads: records.len(),
            qualified: matches > min_matches,
        }
    }

    /// Score a hypothesis by its uniform-model barcode deficit
    #[must_use]
    pub fn uniform_model(hypothesis: &Hypothesis<'_>, records: &ExtractedRecords) -> Self {
        let deficit = barcode_deficit(hypothesis.technology.barcode_length(), &records.barcodes);
        Self {
            technology: hypothesis.technology.name.clone(),
            permutation: hypothesis.permutation.clone(),
            tier: Tier::UniformModel,
            score: deficit,
            reads: records.len(),
            qualified: deficit > 0.0,
        }
    }
}

impl std::fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} [{}] score={:.2} reads={}",
            self.technology, self.permutation, self.tier, self.score, self.reads
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_unique_small_space() {
        // One base: 4 values, 2 draws -> 4 * (1 - (3/4)^2) = 1.75
        assert!((expected_unique(1, 2) - 1.75).abs() < 1e-12);
        assert!((expected_unique(1, 1) - 1.0).abs() < 1e-12);
        assert_eq!(expected_unique(1, 0), 0.0);
    }

    #[test]
    fn test_expected_unique_large_space() {
        // 16-mers: collisions are vanishingly rare at this sample size
        let expected = expected_unique(16, 1000);
        assert!(expected < 1000.0);
        assert!((expected - 1000.0).abs() < 1e-3);

        // Never exceeds the number of draws or the space
        assert!(expected_unique(2, 1_000_000) <= 16.0 + 1e-9);
    }

    #[test]
    fn test_expected_unique_huge_barcode() {
        assert_eq!(expected_unique(2000, 10), 10.0);
    }

    #[test]
    fn test_deficit() {
        let repeated: Vec<String> = vec!["A".repeat(12); 100];
        let deficit = barcode_deficit(12, &repeated);
        assert!(deficit > 98.0);

        let random: Vec<String> = (0..100).map(|i| format!("{i:012}")).collect();
        assert!(barcode_deficit(12, &random).abs() < 1e-3);
    }

    #[test]
    fn test_unique_count() {
        let barcodes: Vec<String> = ["AA", "CC", "AA"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(unique_count(&barcodes), 2);
        assert_eq!(unique_count(&[]), 0);
    }

    #[test]
    fn test_count_to_f64() {
        assert_eq!(count_to_f64(0), 0.0);
        assert_eq!(count_to_f64(100_000), 100_000.0);
    }
}
