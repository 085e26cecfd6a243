use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::catalog::whitelist::Whitelist;
use crate::core::hypothesis::Hypothesis;
use crate::core::technology::Technology;
use crate::matching::extraction::Extraction;
use crate::matching::scoring::{count_to_f64, ScoreReport, Tier};

/// Default fraction of sampled barcodes that must be whitelisted
pub const DEFAULT_BARCODE_THRESHOLD: f64 = 0.5;

/// Relative tolerance under which two uniform-model deficits are a tie
const TIE_TOLERANCE: f64 = 1e-9;

/// Configuration for the classifier
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// A whitelist candidate needs more than `sample_size * barcode_threshold` matches
    pub barcode_threshold: f64,
    /// Directory holding the whitelist files named by the registry
    pub whitelist_dir: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            barcode_threshold: DEFAULT_BARCODE_THRESHOLD,
            whitelist_dir: None,
        }
    }
}

/// What the classifier concluded about a set of input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome<'a> {
    Identified(Hypothesis<'a>),
    Ambiguous(Vec<Hypothesis<'a>>),
    Unidentified,
}

impl<'a> From<Vec<Hypothesis<'a>>> for ClassificationOutcome<'a> {
    fn from(mut hypotheses: Vec<Hypothesis<'a>>) -> Self {
        match hypotheses.len() {
            0 => Self::Unidentified,
            1 => Self::Identified(hypotheses.remove(0)),
            _ => Self::Ambiguous(hypotheses),
        }
    }
}

/// Outcome together with the per-hypothesis scores that led to it
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    pub outcome: ClassificationOutcome<'a>,
    pub reports: Vec<ScoreReport>,
}

/// Two-tier classifier: whitelist matches first, then the uniform-model
/// barcode deficit for technologies without a usable whitelist.
///
/// Whitelists are loaded on first use and kept for the lifetime of the
/// classifier. A whitelist that cannot be loaded is remembered as missing and
/// its technology is scored in the uniform-model tier instead.
#[derive(Debug)]
pub struct Classifier {
    config: ClassifierConfig,
    whitelists: HashMap<String, Option<Whitelist>>,
}

impl Classifier {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            whitelists: HashMap::new(),
        }
    }

    /// Use an already loaded whitelist for `technology`
    #[must_use]
    pub fn with_whitelist(mut self, technology: impl Into<String>, whitelist: Whitelist) -> Self {
        self.whitelists.insert(technology.into(), Some(whitelist));
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Pick the hypotheses that best explain the sample.
    ///
    /// One result is a success, none a failure, several an ambiguity.
    pub fn classify<'a>(
        &mut self,
        extraction: &Extraction,
        sample_size: usize,
        hypotheses: &[Hypothesis<'a>],
    ) -> Vec<Hypothesis<'a>> {
        let scored = self.score_all(extraction, sample_size, hypotheses);
        select(&scored)
    }

    /// Classify and keep the score of every surviving hypothesis
    pub fn evaluate<'a>(
        &mut self,
        extraction: &Extraction,
        sample_size: usize,
        hypotheses: &[Hypothesis<'a>],
    ) -> Classification<'a> {
        let scored = self.score_all(extraction, sample_size, hypotheses);
        let outcome = select(&scored).into();
        Classification {
            outcome,
            reports: scored.into_iter().map(|(_, report)| report).collect(),
        }
    }

    fn score_all<'h, 'a>(
        &mut self,
        extraction: &'h Extraction,
        sample_size: usize,
        hypotheses: &'h [Hypothesis<'a>],
    ) -> Vec<(&'h Hypothesis<'a>, ScoreReport)> {
        if sample_size == 0 {
            debug!("Empty sample, nothing to classify");
            return Vec::new();
        }

        let min_matches = count_to_f64(sample_size) * self.config.barcode_threshold;
        let mut scored = Vec::new();
        for (hypothesis, records) in extraction.surviving(hypotheses) {
            let report = match self.whitelist(hypothesis.technology) {
                Some(whitelist) => {
                    ScoreReport::whitelist(hypothesis, records, whitelist, min_matches)
                }
                None => ScoreReport::uniform_model(hypothesis, records),
            };
            debug!(%report, qualified = report.qualified, "Scored hypothesis");
            scored.push((hypothesis, report));
        }
        scored
    }

    fn whitelist(&mut self, technology: &Technology) -> Option<&Whitelist> {
        if !technology.has_whitelist() {
            return None;
        }

        let dir = self.config.whitelist_dir.as_deref();
        self.whitelists
            .entry(technology.name.clone())
            .or_insert_with(|| match Whitelist::for_technology(technology, dir) {
                Ok(whitelist) => Some(whitelist),
                Err(e) => {
                    warn!(
                        technology = %technology.name,
                        "Whitelist unavailable, using uniform model instead: {e}"
                    );
                    None
                }
            })
            .as_ref()
    }
}

/// Apply the tier rules to scored hypotheses
fn select<'a>(scored: &[(&Hypothesis<'a>, ScoreReport)]) -> Vec<Hypothesis<'a>> {
    let mut best: Option<f64> = None;
    let mut leaders: Vec<&Hypothesis<'a>> = Vec::new();
    for (hypothesis, report) in scored
        .iter()
        .filter(|(_, r)| r.tier == Tier::Whitelist && r.qualified)
    {
        // Whitelist scores are whole match counts, so equality is exact
        match best {
            Some(score) if report.score < score => {}
            Some(score) if report.score == score => leaders.push(*hypothesis),
            _ => {
                best = Some(report.score);
                leaders = vec![*hypothesis];
            }
        }
    }

    if let Some(&winner) = leaders.first() {
        if leaders.len() > 1 {
            let tied: Vec<String> = leaders.iter().map(ToString::to_string).collect();
            warn!(
                tied = %tied.join(", "),
                "Whitelist tie, keeping the first candidate"
            );
        }
        info!(hypothesis = %winner, "Identified by whitelist");
        return vec![winner.clone()];
    }

    let uniform: Vec<(&Hypothesis<'a>, f64)> = scored
        .iter()
        .filter(|(_, r)| r.tier == Tier::UniformModel && r.qualified)
        .map(|(h, r)| (*h, r.score))
        .collect();
    let Some(max) = uniform.iter().map(|(_, s)| *s).reduce(f64::max) else {
        debug!("No hypothesis qualified in either tier");
        return Vec::new();
    };

    let winners: Vec<Hypothesis<'a>> = uniform
        .into_iter()
        .filter(|(_, score)| max - score <= TIE_TOLERANCE * max)
        .map(|(h, _)| h.clone())
        .collect();
    if winners.len() == 1 {
        info!(hypothesis = %winners[0], deficit = max, "Identified by uniform model");
    }
    winners
}
