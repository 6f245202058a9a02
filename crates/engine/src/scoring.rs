//! Unusualness scoring
//!
//! Weighted absolute z-score aggregation mapped to a 0-100 percentile rank
//! against the instrument's own trailing score history:
//!
//! ```text
//! raw   S_t = sum over valid weighted features of  w_k * |Z_k(t)|
//! rank  U_t = percentile of S_t within its own trailing window
//! band  Normal / Elevated / Unusual / Extreme
//! ```
//!
//! Weights are fixed diagnostic allocations, not tuned, and are never
//! renormalized when features are excluded — a day with half its features
//! missing can only look *less* unusual, never more.

use std::collections::BTreeMap;

use basalt_core::Feature;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed diagnostic weights (sum = 1.00)
pub const FEATURE_WEIGHTS: [(Feature, f64); 5] = [
    (Feature::DarkShare, 0.25),
    (Feature::Gex, 0.25),
    (Feature::VenueMix, 0.20),
    (Feature::BlockIntensity, 0.15),
    (Feature::IvRank, 0.15),
];

/// Interpretation bands for percentile scores (half-open, left-inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpretationBand {
    /// [0, 30) — within historical norms
    Normal,
    /// [30, 60) — measurable deviation
    Elevated,
    /// [60, 80) — significant departure
    Unusual,
    /// [80, 100] — rare configuration
    Extreme,
}

impl InterpretationBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpretationBand::Normal => "Normal",
            InterpretationBand::Elevated => "Elevated",
            InterpretationBand::Unusual => "Unusual",
            InterpretationBand::Extreme => "Extreme",
        }
    }
}

impl std::fmt::Display for InterpretationBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of unusualness scoring for a single (instrument, date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Weighted absolute z-score sum
    pub raw_score: f64,
    /// Percentile rank in [0, 100]; None without score history
    pub percentile_score: Option<f64>,
    /// Interpretation band for the percentile
    pub interpretation: InterpretationBand,
    /// Per-feature contribution (w_k * |Z_k|)
    pub feature_contributions: BTreeMap<Feature, f64>,
    /// Features excluded from the sum
    pub excluded_features: Vec<Feature>,
}

impl ScoringResult {
    /// Top contributing features, sorted by contribution descending
    pub fn top_contributors(&self, n: usize) -> Vec<(Feature, f64)> {
        let mut sorted: Vec<(Feature, f64)> = self
            .feature_contributions
            .iter()
            .map(|(&f, &c)| (f, c))
            .collect();
        sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        sorted.truncate(n);
        sorted
    }
}

/// Unusualness scoring engine with percentile mapping
#[derive(Debug, Clone)]
pub struct Scorer {
    window: usize,
    weights: BTreeMap<Feature, f64>,
}

impl Scorer {
    /// Create a scorer with the fixed diagnostic weights
    pub fn new(window: usize) -> Result<Self> {
        Self::with_weights(window, FEATURE_WEIGHTS.into_iter().collect())
    }

    /// Create a scorer with custom weights; rejects weights whose sum is
    /// not approximately 1.0 (fail-fast misconfiguration check)
    pub fn with_weights(window: usize, weights: BTreeMap<Feature, f64>) -> Result<Self> {
        if window < 1 {
            return Err(Error::InvalidWindow(window));
        }
        let sum: f64 = weights.values().sum();
        if !(0.99..=1.01).contains(&sum) {
            return Err(Error::InvalidWeights(sum));
        }
        Ok(Self { window, weights })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Compute the raw weighted absolute z-score sum
    ///
    /// Sums w_k * |Z_k| over features that are present, not excluded,
    /// non-missing, and carry a nonzero weight. Weights are NOT
    /// renormalized on exclusion.
    pub fn raw_score(
        &self,
        z_scores: &BTreeMap<Feature, Option<f64>>,
        excluded: &[Feature],
    ) -> (f64, BTreeMap<Feature, f64>) {
        let mut raw = 0.0;
        let mut contributions = BTreeMap::new();

        for (&feature, &z) in z_scores {
            if excluded.contains(&feature) {
                continue;
            }
            let Some(z) = z else { continue };
            let weight = self.weights.get(&feature).copied().unwrap_or(0.0);
            if weight == 0.0 {
                continue;
            }

            let contribution = weight * z.abs();
            contributions.insert(feature, contribution);
            raw += contribution;
        }

        (raw, contributions)
    }

    /// Percentile rank of each raw score within its own trailing window
    ///
    /// Same windowing rule as the baseline: expanding during cold start,
    /// then rolling. Rank = (count of window values <= current) / window
    /// size * 100. Missing values drop out of the window and propagate for
    /// the evaluated index.
    ///
    /// The current observation is included in its own ranking window, so
    /// the window maximum always scores exactly 100.
    pub fn percentile_scores(
        &self,
        raw_scores: &[Option<f64>],
        expanding: bool,
    ) -> Vec<Option<f64>> {
        let mut percentiles = Vec::with_capacity(raw_scores.len());

        for i in 0..raw_scores.len() {
            let Some(current) = raw_scores[i] else {
                percentiles.push(None);
                continue;
            };

            let start = if expanding && i < self.window {
                0
            } else {
                (i + 1).saturating_sub(self.window)
            };
            let window: Vec<f64> = raw_scores[start..=i].iter().filter_map(|&v| v).collect();

            // window is non-empty: it contains at least the current value
            let rank = window.iter().filter(|&&v| v <= current).count();
            percentiles.push(Some(rank as f64 / window.len() as f64 * 100.0));
        }

        percentiles
    }

    /// Interpretation band for a percentile score (missing maps to Normal)
    pub fn interpretation(&self, percentile_score: Option<f64>) -> InterpretationBand {
        let Some(p) = percentile_score else {
            return InterpretationBand::Normal;
        };
        if p < 30.0 {
            InterpretationBand::Normal
        } else if p < 60.0 {
            InterpretationBand::Elevated
        } else if p < 80.0 {
            InterpretationBand::Unusual
        } else {
            InterpretationBand::Extreme
        }
    }

    /// Full unusualness score for a single time point
    ///
    /// Appends the current raw score to the provided history and ranks it
    /// within the resulting window. Without history the percentile is
    /// `None` and the band defaults to Normal.
    pub fn compute(
        &self,
        z_scores: &BTreeMap<Feature, Option<f64>>,
        history: Option<&[Option<f64>]>,
        excluded: &[Feature],
    ) -> ScoringResult {
        let (raw, contributions) = self.raw_score(z_scores, excluded);

        let percentile = history.and_then(|h| {
            let mut extended: Vec<Option<f64>> = h.to_vec();
            extended.push(Some(raw));
            self.percentile_scores(&extended, true).pop().flatten()
        });

        ScoringResult {
            raw_score: raw,
            percentile_score: percentile,
            interpretation: self.interpretation(percentile),
            feature_contributions: contributions,
            excluded_features: excluded.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z_map(entries: &[(Feature, f64)]) -> BTreeMap<Feature, Option<f64>> {
        entries.iter().map(|&(f, z)| (f, Some(z))).collect()
    }

    #[test]
    fn test_weight_validation() {
        assert!(Scorer::new(63).is_ok());
        assert!(matches!(Scorer::new(0), Err(Error::InvalidWindow(0))));

        let bad: BTreeMap<Feature, f64> =
            [(Feature::Gex, 0.5), (Feature::DarkShare, 0.3)].into_iter().collect();
        assert!(matches!(
            Scorer::with_weights(63, bad),
            Err(Error::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_all_features_at_unit_z_sum_to_one() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&Feature::WEIGHTED.map(|f| (f, 1.0)));
        let (raw, contributions) = scorer.raw_score(&z, &[]);
        assert!((raw - 1.0).abs() < 1e-12);
        assert_eq!(contributions.len(), 5);
    }

    #[test]
    fn test_no_renormalization_on_exclusion() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&Feature::WEIGHTED.map(|f| (f, 1.0)));

        // Exclude venue_mix (0.20): remaining weight sum is 0.80
        let (raw, contributions) = scorer.raw_score(&z, &[Feature::VenueMix]);
        assert!((raw - 0.80).abs() < 1e-12);
        assert!(!contributions.contains_key(&Feature::VenueMix));
    }

    #[test]
    fn test_raw_score_spec_example() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&[(Feature::Gex, 2.0), (Feature::DarkShare, 1.5)]);
        let (raw, _) = scorer.raw_score(&z, &[]);
        // 0.25 * 2.0 + 0.25 * 1.5
        assert!((raw - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_negative_z_uses_absolute_value() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&[(Feature::Gex, -2.0)]);
        let (raw, _) = scorer.raw_score(&z, &[]);
        assert!((raw - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_and_unweighted_skipped() {
        let scorer = Scorer::new(63).unwrap();
        let mut z = z_map(&[(Feature::Gex, 2.0), (Feature::Efficiency, 5.0)]);
        z.insert(Feature::DarkShare, None);
        let (raw, contributions) = scorer.raw_score(&z, &[]);
        // efficiency has no weight; dark_share is missing
        assert!((raw - 0.5).abs() < 1e-12);
        assert_eq!(contributions.len(), 1);
    }

    #[test]
    fn test_window_maximum_scores_100() {
        let scorer = Scorer::new(63).unwrap();
        let raw: Vec<Option<f64>> =
            vec![Some(1.0), Some(1.5), Some(2.0), Some(1.2), Some(3.0)];
        let percentiles = scorer.percentile_scores(&raw, true);
        assert_eq!(percentiles[4], Some(100.0));
        // first value is trivially its own maximum
        assert_eq!(percentiles[0], Some(100.0));
    }

    #[test]
    fn test_percentile_idempotent_under_identical_appends() {
        let scorer = Scorer::new(63).unwrap();
        let raw = vec![Some(3.0), Some(3.0), Some(3.0)];
        let percentiles = scorer.percentile_scores(&raw, true);
        assert_eq!(percentiles[2], Some(100.0));
    }

    #[test]
    fn test_percentile_missing_propagates() {
        let scorer = Scorer::new(63).unwrap();
        let raw = vec![Some(1.0), None, Some(2.0)];
        let percentiles = scorer.percentile_scores(&raw, true);
        assert_eq!(percentiles[1], None);
        // missing values drop out of the window
        assert_eq!(percentiles[2], Some(100.0));
    }

    #[test]
    fn test_percentile_rolling_window() {
        let scorer = Scorer::new(3).unwrap();
        let raw = vec![Some(10.0), Some(9.0), Some(1.0), Some(2.0), Some(3.0)];
        let percentiles = scorer.percentile_scores(&raw, true);
        // index 4: window [1, 2, 3], all <= 3
        assert_eq!(percentiles[4], Some(100.0));
        // index 3: window [9, 1, 2] -> 2 of 3 <= 2
        assert!((percentiles[3].unwrap() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpretation_bands() {
        let scorer = Scorer::new(63).unwrap();
        assert_eq!(scorer.interpretation(Some(0.0)), InterpretationBand::Normal);
        assert_eq!(scorer.interpretation(Some(29.9)), InterpretationBand::Normal);
        assert_eq!(scorer.interpretation(Some(30.0)), InterpretationBand::Elevated);
        assert_eq!(scorer.interpretation(Some(60.0)), InterpretationBand::Unusual);
        assert_eq!(scorer.interpretation(Some(80.0)), InterpretationBand::Extreme);
        assert_eq!(scorer.interpretation(Some(100.0)), InterpretationBand::Extreme);
        assert_eq!(scorer.interpretation(None), InterpretationBand::Normal);
    }

    #[test]
    fn test_compute_with_history() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&[(Feature::Gex, 4.0), (Feature::DarkShare, 4.0)]);
        let history = vec![Some(0.5), Some(0.8), Some(1.2)];

        let result = scorer.compute(&z, Some(&history), &[]);
        assert!((result.raw_score - 2.0).abs() < 1e-12);
        // highest of the extended window
        assert_eq!(result.percentile_score, Some(100.0));
        assert_eq!(result.interpretation, InterpretationBand::Extreme);
    }

    #[test]
    fn test_compute_without_history() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&[(Feature::Gex, 2.0)]);
        let result = scorer.compute(&z, None, &[]);
        assert_eq!(result.percentile_score, None);
        assert_eq!(result.interpretation, InterpretationBand::Normal);
    }

    #[test]
    fn test_top_contributors_sorted_descending() {
        let scorer = Scorer::new(63).unwrap();
        let z = z_map(&[
            (Feature::Gex, 2.5),
            (Feature::DarkShare, 1.8),
            (Feature::IvRank, 0.5),
        ]);
        let result = scorer.compute(&z, None, &[]);
        let top = result.top_contributors(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, Feature::Gex);
        assert_eq!(top[1].0, Feature::DarkShare);
    }
}
