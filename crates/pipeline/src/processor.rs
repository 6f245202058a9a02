//! Per-ticker diagnostic evaluation
//!
//! Binds the four engine stages to a loaded feature panel: z-scores and
//! validity per feature, raw-score history and percentile rank, regime
//! classification, and the assembled diagnostic output. Evaluation is
//! pure over the panel, so the orchestrator runs it concurrently across
//! tickers without coordination.

use std::collections::{BTreeMap, HashMap};

use basalt_core::{Feature, FeatureSeries, FeatureSnapshot};
use basalt_engine::{
    Baseline, Classifier, DiagnosticOutput, ExcludedFeature, Explainer, Scorer, ScoringResult,
};
use basalt_universe::StressSignals;
use chrono::NaiveDate;

use crate::error::Result;
use crate::ports::FeaturePanel;

/// Diagnostic output plus the stress signals the universe feedback pass
/// reads from it
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub output: DiagnosticOutput,
    pub stress: StressSignals,
}

/// Stateless per-ticker evaluator
///
/// Owns configured engine components; all evaluation state lives in the
/// panel passed per call.
#[derive(Debug, Clone)]
pub struct Processor {
    baseline: Baseline,
    scorer: Scorer,
    classifier: Classifier,
    explainer: Explainer,
}

impl Processor {
    /// Build the engine stack, rejecting malformed parameters fail-fast
    pub fn new(window: usize, min_periods: usize, drift_threshold: f64) -> Result<Self> {
        Ok(Self {
            baseline: Baseline::new(window, min_periods, drift_threshold)?,
            scorer: Scorer::new(window)?,
            classifier: Classifier::new(),
            explainer: Explainer::new(),
        })
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Value for the evaluation date: the exact date when the series has
    /// it, otherwise the most recent observation (the target may be a
    /// weekend or holiday)
    fn latest_value(series: &FeatureSeries, date: NaiveDate) -> Option<f64> {
        let on_date = series.observations().iter().position(|o| o.date == date);
        match on_date {
            Some(i) => series.value_at(i),
            None => series.last_value(),
        }
    }

    /// Same fallback rule over a z-score vector aligned to the series
    fn latest_z(
        series: &FeatureSeries,
        z_series: &[Option<f64>],
        date: NaiveDate,
    ) -> Option<f64> {
        let on_date = series.observations().iter().position(|o| o.date == date);
        match on_date {
            Some(i) => z_series.get(i).copied().flatten(),
            None => z_series.last().copied().flatten(),
        }
    }

    /// Weighted raw-score history for every date strictly before the
    /// evaluation date, aligned across ragged feature series by date
    fn raw_score_history(
        &self,
        z_by_feature: &BTreeMap<Feature, (&FeatureSeries, Vec<Option<f64>>)>,
        date: NaiveDate,
    ) -> Vec<Option<f64>> {
        let mut by_date: BTreeMap<NaiveDate, BTreeMap<Feature, Option<f64>>> = BTreeMap::new();
        for (&feature, (series, z_series)) in z_by_feature {
            for (observation, &z) in series.observations().iter().zip(z_series.iter()) {
                if observation.date < date {
                    by_date.entry(observation.date).or_default().insert(feature, z);
                }
            }
        }

        by_date
            .values()
            .map(|z_map| {
                if z_map.values().any(|z| z.is_some()) {
                    let (raw, _) = self.scorer.raw_score(z_map, &[]);
                    Some(raw)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Run the full diagnostic for one ticker on one date.
    ///
    /// Never errors on incomplete data: an empty panel or insufficient
    /// baseline degrades to Undetermined with exclusion reasons.
    pub fn evaluate(&self, ticker: &str, date: NaiveDate, panel: &FeaturePanel) -> Evaluation {
        let ticker = ticker.to_uppercase();

        if panel.is_empty() {
            let regime = self.classifier.classify(&FeatureSnapshot::new());
            let output = self.explainer.explain(
                regime,
                None,
                Vec::new(),
                basalt_engine::BaselineState::Empty,
                ticker,
                date,
            );
            return Evaluation {
                output,
                stress: StressSignals::new(),
            };
        }

        // Stage 1: z-scores and validity per feature
        let mut z_by_feature: BTreeMap<Feature, (&FeatureSeries, Vec<Option<f64>>)> =
            BTreeMap::new();
        let mut counts: HashMap<Feature, usize> = HashMap::new();
        for (&feature, series) in &panel.features {
            let z_series = self.baseline.z_scores(series, true);
            counts.insert(feature, series.valid_count());
            z_by_feature.insert(feature, (series, z_series));
        }

        let z_latest: BTreeMap<Feature, Option<f64>> = z_by_feature
            .iter()
            .map(|(&feature, (series, z_series))| {
                (feature, Self::latest_z(series, z_series, date))
            })
            .collect();

        let state = self.baseline.state(&counts);

        // Exclusions: below min_periods, or valid baseline but no value today
        let mut excluded: Vec<ExcludedFeature> = self
            .baseline
            .excluded_features(&counts)
            .into_iter()
            .map(|(f, n)| ExcludedFeature::insufficient(f, n, self.baseline.min_periods()))
            .collect();
        let mut excluded_from_score: Vec<Feature> = excluded.iter().map(|e| e.feature).collect();
        for (&feature, &z) in &z_latest {
            if z.is_none() && counts[&feature] >= self.baseline.min_periods() {
                excluded.push(ExcludedFeature::missing_value(feature));
                excluded_from_score.push(feature);
            }
        }

        // Stage 2: unusualness against the ticker's own score history
        let scoring: Option<ScoringResult> = if state.is_sufficient() {
            let history = self.raw_score_history(&z_by_feature, date);
            Some(
                self.scorer
                    .compute(&z_latest, Some(&history), &excluded_from_score),
            )
        } else {
            None
        };

        // Stage 3: regime classification
        let raw_latest = |feature: Feature| {
            panel
                .get(feature)
                .and_then(|series| Self::latest_value(series, date))
        };
        let median_latest = |feature: Feature| {
            panel.get(feature).and_then(|series| {
                self.baseline
                    .statistics(series, true)
                    .last()
                    .and_then(|s| s.median)
            })
        };

        let snapshot = FeatureSnapshot {
            z_gex: z_latest.get(&Feature::Gex).copied().flatten(),
            z_dex: z_latest.get(&Feature::Dex).copied().flatten(),
            z_block: z_latest.get(&Feature::BlockIntensity).copied().flatten(),
            dark_share: raw_latest(Feature::DarkShare),
            efficiency: raw_latest(Feature::Efficiency),
            impact: raw_latest(Feature::Impact),
            efficiency_median: median_latest(Feature::Efficiency),
            impact_median: median_latest(Feature::Impact),
            daily_return: panel.daily_return,
            baseline_sufficient: state.is_sufficient(),
        };
        let regime = self.classifier.classify(&snapshot);

        // Stage 4: assembled output
        let stress = StressSignals {
            unusualness: scoring.as_ref().and_then(|s| s.percentile_score),
            z_gex: snapshot.z_gex,
            dark_share: snapshot.dark_share,
            z_block: snapshot.z_block,
        };
        let output = self
            .explainer
            .explain(regime, scoring, excluded, state, ticker, date);

        Evaluation { output, stress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_engine::{BaselineState, InterpretationBand, RegimeType};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn flat_series(n: usize, base: f64) -> FeatureSeries {
        let values: Vec<Option<f64>> = (0..n)
            .map(|i| Some(base + 0.1 * ((i % 7) as f64 - 3.0)))
            .collect();
        FeatureSeries::from_daily(start(), &values)
    }

    fn spiking_series(n: usize, base: f64, spike: f64) -> FeatureSeries {
        let mut values: Vec<Option<f64>> = (0..n)
            .map(|i| Some(base + 0.1 * ((i % 7) as f64 - 3.0)))
            .collect();
        *values.last_mut().unwrap() = Some(spike);
        FeatureSeries::from_daily(start(), &values)
    }

    fn processor() -> Processor {
        Processor::new(63, 21, 0.10).unwrap()
    }

    #[test]
    fn test_empty_panel_degrades_to_undetermined() {
        let evaluation = processor().evaluate("xyz", start(), &FeaturePanel::new());
        assert_eq!(evaluation.output.regime_result.regime, RegimeType::Undetermined);
        assert_eq!(evaluation.output.baseline_state, BaselineState::Empty);
        assert_eq!(evaluation.output.ticker, "XYZ");
        assert!(evaluation.output.scoring_result.is_none());
        assert_eq!(evaluation.stress, StressSignals::new());
    }

    #[test]
    fn test_short_history_excludes_and_undetermines() {
        let panel = FeaturePanel::new().with_feature(Feature::Gex, flat_series(10, 0.0));
        let date = start() + chrono::Days::new(9);

        let evaluation = processor().evaluate("SPY", date, &panel);
        assert_eq!(evaluation.output.regime_result.regime, RegimeType::Undetermined);
        assert_eq!(evaluation.output.baseline_state, BaselineState::Empty);
        assert_eq!(evaluation.output.excluded_features.len(), 1);
        assert_eq!(evaluation.output.excluded_features[0].reason, "n = 10 < 21");
    }

    #[test]
    fn test_spiking_gex_scores_extreme_and_feeds_stress() {
        let panel = FeaturePanel::new()
            .with_feature(Feature::Gex, spiking_series(40, 0.0, 8.0))
            .with_feature(Feature::DarkShare, flat_series(40, 0.40));
        let date = start() + chrono::Days::new(39);

        let evaluation = processor().evaluate("NVDA", date, &panel);

        let scoring = evaluation.output.scoring_result.as_ref().unwrap();
        assert_eq!(scoring.percentile_score, Some(100.0));
        assert_eq!(scoring.interpretation, InterpretationBand::Extreme);
        assert_eq!(evaluation.output.baseline_state, BaselineState::Complete);

        assert_eq!(evaluation.stress.unusualness, Some(100.0));
        assert!(evaluation.stress.z_gex.unwrap() > 2.0);
    }

    #[test]
    fn test_weekend_date_falls_back_to_last_observation() {
        let panel = FeaturePanel::new().with_feature(Feature::Gex, flat_series(40, 0.0));
        // two days past the last observation in the series
        let date = start() + chrono::Days::new(41);

        let evaluation = processor().evaluate("SPY", date, &panel);
        assert_eq!(evaluation.output.baseline_state, BaselineState::Complete);
        assert!(evaluation.stress.z_gex.is_some());
    }

    #[test]
    fn test_missing_today_reported_with_valid_baseline() {
        let mut values: Vec<Option<f64>> = (0..40)
            .map(|i| Some(0.1 * ((i % 7) as f64 - 3.0)))
            .collect();
        *values.last_mut().unwrap() = None;
        let panel = FeaturePanel::new()
            .with_feature(Feature::Gex, FeatureSeries::from_daily(start(), &values));
        let date = start() + chrono::Days::new(39);

        let evaluation = processor().evaluate("SPY", date, &panel);
        assert_eq!(evaluation.output.excluded_features.len(), 1);
        assert_eq!(evaluation.output.excluded_features[0].reason, "missing value");
        // the day itself contributes nothing to the score
        let scoring = evaluation.output.scoring_result.as_ref().unwrap();
        assert_eq!(scoring.raw_score, 0.0);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(Processor::new(10, 21, 0.10).is_err());
        assert!(Processor::new(63, 1, 0.10).is_err());
        assert!(Processor::new(63, 21, 0.0).is_err());
    }
}
