//! Diagnostic Engine Integration Test
//!
//! Tests the full flow over synthetic daily series:
//! 1. Baseline computes rolling statistics and z-scores
//! 2. Scorer aggregates weighted |z| and ranks it against history
//! 3. Classifier assigns a regime from the snapshot
//! 4. Explainer renders the combined diagnostic

use std::collections::{BTreeMap, HashMap};

use basalt_core::{Feature, FeatureSeries, FeatureSnapshot};
use basalt_engine::{
    Baseline, BaselineState, Classifier, Condition, Explainer, ExcludedFeature,
    InterpretationBand, RegimeType, Scorer,
};
use chrono::NaiveDate;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// A gently noisy series with a spike on the final day
fn spiking_series(n: usize, base: f64, spike: f64) -> FeatureSeries {
    let values: Vec<Option<f64>> = (0..n)
        .map(|i| {
            if i == n - 1 {
                Some(spike)
            } else {
                // deterministic small oscillation around the base
                Some(base + 0.1 * ((i % 5) as f64 - 2.0))
            }
        })
        .collect();
    FeatureSeries::from_daily(start(), &values)
}

#[test]
fn test_full_diagnostic_flow() {
    let baseline = Baseline::new(63, 21, 0.10).unwrap();
    let scorer = Scorer::new(63).unwrap();
    let classifier = Classifier::new();
    let explainer = Explainer::new();

    // 40 days of history, GEX spiking hard on the last day
    let gex = spiking_series(40, 0.0, 5.0);
    let dark_share = spiking_series(40, 0.40, 0.45);

    // === Stage 1: Baseline ===
    let z_gex = baseline.z_scores(&gex, true);
    let z_dark = baseline.z_scores(&dark_share, true);
    let last = gex.len() - 1;
    assert!(z_gex[last].unwrap() > 1.5, "spike should be far above baseline");

    let counts = HashMap::from([
        (Feature::Gex, gex.valid_count()),
        (Feature::DarkShare, dark_share.valid_count()),
    ]);
    let state = baseline.state(&counts);
    assert_eq!(state, BaselineState::Complete);

    // === Stage 2: Scorer ===
    let mut raw_history: Vec<Option<f64>> = Vec::new();
    for i in 0..last {
        let z: BTreeMap<Feature, Option<f64>> = [
            (Feature::Gex, z_gex[i]),
            (Feature::DarkShare, z_dark[i]),
        ]
        .into_iter()
        .collect();
        let (raw, _) = scorer.raw_score(&z, &[]);
        raw_history.push(if z_gex[i].is_some() || z_dark[i].is_some() {
            Some(raw)
        } else {
            None
        });
    }

    let z_today: BTreeMap<Feature, Option<f64>> = [
        (Feature::Gex, z_gex[last]),
        (Feature::DarkShare, z_dark[last]),
    ]
    .into_iter()
    .collect();
    let scoring = scorer.compute(&z_today, Some(&raw_history), &[]);
    assert_eq!(scoring.percentile_score, Some(100.0));
    assert_eq!(scoring.interpretation, InterpretationBand::Extreme);

    // === Stage 3: Classifier ===
    let efficiency_stats = baseline.statistics(&spiking_series(40, 0.004, 0.003), true);
    let efficiency_median = efficiency_stats[last].median.unwrap();
    let snapshot = FeatureSnapshot::new()
        .with_baseline_sufficient(state.is_sufficient())
        .with_z_gex(z_gex[last].unwrap())
        .with_efficiency(0.001, efficiency_median);
    let regime = classifier.classify(&snapshot);
    assert_eq!(regime.regime, RegimeType::GammaPositive);

    // === Stage 4: Explainer ===
    let output = explainer.explain(
        regime,
        Some(scoring),
        Vec::new(),
        state,
        "SPY",
        start() + chrono::Days::new(last as u64),
    );

    let full = output.format_full();
    assert!(full.contains("Regime: Γ⁺ (Gamma-Positive Control)"));
    assert!(full.contains("Unusualness: 100 (Extreme)"));
    assert!(full.contains("Excluded: none"));
    assert!(full.contains("Baseline: COMPLETE"));

    let value = output.to_value();
    assert_eq!(value["regime"]["type"], "Γ⁺");
    assert_eq!(value["unusualness"]["score"], 100.0);
}

#[test]
fn test_spec_end_to_end_gamma_positive_triggers() {
    // z_scores = {gex: 2.0, dex: 0, dark_share: 0}, efficiency 0.003 below
    // median 0.004, sufficient baseline -> gamma-positive with the literal
    // condition values carried through verbatim
    let classifier = Classifier::new();
    let snapshot = FeatureSnapshot::new()
        .with_baseline_sufficient(true)
        .with_z_gex(2.0)
        .with_z_dex(0.0)
        .with_dark_share(0.0)
        .with_efficiency(0.003, 0.004);

    let result = classifier.classify(&snapshot);
    assert_eq!(result.regime, RegimeType::GammaPositive);
    assert_eq!(
        result.triggering_conditions,
        vec![
            ("Z_GEX", Condition::met(2.0, 1.5)),
            ("Efficiency_vs_median", Condition::met(0.003, 0.004)),
        ]
    );
}

#[test]
fn test_spec_end_to_end_raw_score() {
    // weights: gex .25, dark_share .25 -> 0.25*2.0 + 0.25*1.5 = 0.875
    let scorer = Scorer::new(63).unwrap();
    let z: BTreeMap<Feature, Option<f64>> = [
        (Feature::Gex, Some(2.0)),
        (Feature::DarkShare, Some(1.5)),
    ]
    .into_iter()
    .collect();
    let (raw, contributions) = scorer.raw_score(&z, &[]);
    assert!((raw - 0.875).abs() < 1e-12);
    assert_eq!(contributions.len(), 2);
}

#[test]
fn test_insufficient_data_degrades_without_error() {
    // 10 observations: below min_periods everywhere. The pipeline must
    // degrade to UND with exclusion reasons, never error.
    let baseline = Baseline::new(63, 21, 0.10).unwrap();
    let classifier = Classifier::new();
    let explainer = Explainer::new();

    let short = FeatureSeries::from_daily(start(), &vec![Some(1.0); 10]);
    let z = baseline.z_scores(&short, true);
    assert!(z.iter().all(|v| v.is_none()));

    let counts = HashMap::from([(Feature::Gex, short.valid_count())]);
    let state = baseline.state(&counts);
    assert_eq!(state, BaselineState::Empty);

    let excluded: Vec<ExcludedFeature> = baseline
        .excluded_features(&counts)
        .into_iter()
        .map(|(f, n)| ExcludedFeature::insufficient(f, n, baseline.min_periods()))
        .collect();

    let snapshot = FeatureSnapshot::new().with_baseline_sufficient(state.is_sufficient());
    let regime = classifier.classify(&snapshot);
    assert_eq!(regime.regime, RegimeType::Undetermined);

    let output = explainer.explain(regime, None, excluded, state, "XYZ", start());
    let full = output.format_full();
    assert!(full.contains("Regime: UND (Undetermined)"));
    assert!(full.contains("Unusualness: N/A (insufficient data)"));
    assert!(full.contains("gex (n = 10 < 21)"));
    assert!(full.contains("Baseline: EMPTY"));
}
