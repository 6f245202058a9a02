//! Explainability protocol
//!
//! Produces the canonical diagnostic output that explains:
//! 1. The assigned regime and its triggering condition values
//! 2. The unusualness score and its top drivers
//! 3. Excluded features with reasons
//! 4. The baseline state (data sufficiency)
//!
//! The explainer is a pure formatter — it combines pre-computed results
//! without reinterpreting or re-rounding any value. If data is missing, it
//! says so explicitly; there are no silent failures.

use basalt_core::Feature;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

use crate::baseline::BaselineState;
use crate::classifier::RegimeResult;
use crate::scoring::ScoringResult;

/// Record of a feature excluded from analysis, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedFeature {
    pub feature: Feature,
    pub reason: String,
}

impl ExcludedFeature {
    pub fn new(feature: Feature, reason: impl Into<String>) -> Self {
        Self {
            feature,
            reason: reason.into(),
        }
    }

    /// Standard insufficient-observations reason, e.g. `n = 14 < 21`
    pub fn insufficient(feature: Feature, n_obs: usize, min_required: usize) -> Self {
        Self::new(feature, format!("n = {} < {}", n_obs, min_required))
    }

    /// Standard missing-value reason (input present but NaN/absent today)
    pub fn missing_value(feature: Feature) -> Self {
        Self::new(feature, "missing value")
    }
}

impl fmt::Display for ExcludedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.feature, self.reason)
    }
}

/// Complete diagnostic output for one instrument on one date
///
/// The system's canonical output unit: immutable aggregate of the regime
/// classification, the unusualness score, exclusion reasons, and the
/// baseline state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticOutput {
    pub regime_result: RegimeResult,
    pub scoring_result: Option<ScoringResult>,
    pub excluded_features: Vec<ExcludedFeature>,
    pub baseline_state: BaselineState,
    pub ticker: String,
    pub date: NaiveDate,
}

impl DiagnosticOutput {
    /// Regime section: label, description, and triggering conditions
    pub fn format_regime(&self) -> String {
        let mut lines = vec![format!(
            "Regime: {} ({})",
            self.regime_result.regime.label(),
            self.regime_result.regime.description()
        )];

        if self.regime_result.triggering_conditions.is_empty() {
            // NEU or UND carry no specific triggers
            lines.push(format!("  {}", self.regime_result.interpretation));
        } else {
            lines.push(self.regime_result.format_conditions());
        }

        lines.join("\n")
    }

    /// Score section: percentile, band, and top drivers
    pub fn format_score(&self) -> String {
        let Some(scoring) = &self.scoring_result else {
            return "Unusualness: N/A (insufficient data)".to_string();
        };

        let score = match scoring.percentile_score {
            Some(p) => format!("{:.0}", p),
            None => "N/A".to_string(),
        };
        let mut lines = vec![format!(
            "Unusualness: {} ({})",
            score, scoring.interpretation
        )];

        let top = scoring.top_contributors(3);
        if !top.is_empty() {
            let drivers: Vec<String> = top
                .iter()
                .map(|(feature, contribution)| {
                    format!("{} contrib={:.2}", feature.label(), contribution)
                })
                .collect();
            lines.push(format!("Top drivers: {}", drivers.join("; ")));
        }

        lines.join("\n")
    }

    /// Excluded-features section, `Excluded: none` when empty
    pub fn format_excluded_features(&self) -> String {
        if self.excluded_features.is_empty() {
            return "Excluded: none".to_string();
        }

        let parts: Vec<String> = self
            .excluded_features
            .iter()
            .map(|e| e.to_string())
            .collect();
        format!("Excluded: {}", parts.join(", "))
    }

    /// Baseline-state section
    pub fn format_baseline_state(&self) -> String {
        format!("Baseline: {}", self.baseline_state)
    }

    /// Fixed 4-section plain-text rendering
    pub fn format_full(&self) -> String {
        [
            format!(
                "=== Basalt Diagnostic: {} @ {} ===",
                self.ticker, self.date
            ),
            String::new(),
            self.format_regime(),
            String::new(),
            self.format_score(),
            String::new(),
            self.format_excluded_features(),
            self.format_baseline_state(),
        ]
        .join("\n")
    }

    /// Structured rendering with a stable schema
    pub fn to_value(&self) -> Value {
        let triggering: serde_json::Map<String, Value> = self
            .regime_result
            .triggering_conditions
            .iter()
            .map(|(name, c)| {
                (
                    name.to_string(),
                    json!({
                        "value": c.observed,
                        "threshold": c.threshold,
                        "met": c.satisfied,
                    }),
                )
            })
            .collect();

        let unusualness = match &self.scoring_result {
            Some(scoring) => json!({
                "score": scoring.percentile_score,
                "interpretation": scoring.interpretation.as_str(),
                "raw_score": scoring.raw_score,
                "top_contributors": scoring
                    .top_contributors(3)
                    .iter()
                    .map(|(feature, contribution)| json!({
                        "feature": feature.as_str(),
                        "contribution": contribution,
                    }))
                    .collect::<Vec<_>>(),
            }),
            None => json!({
                "score": Value::Null,
                "interpretation": Value::Null,
                "raw_score": Value::Null,
                "top_contributors": [],
            }),
        };

        json!({
            "ticker": self.ticker,
            "date": self.date.to_string(),
            "regime": {
                "type": self.regime_result.regime.label(),
                "description": self.regime_result.regime.description(),
                "interpretation": self.regime_result.interpretation,
                "triggering_conditions": triggering,
                "baseline_sufficient": self.regime_result.baseline_sufficient,
            },
            "unusualness": unusualness,
            "excluded_features": self.excluded_features
                .iter()
                .map(|e| json!({
                    "feature": e.feature.as_str(),
                    "reason": e.reason,
                }))
                .collect::<Vec<_>>(),
            "baseline_state": self.baseline_state.as_str(),
        })
    }
}

/// Stateless assembler of diagnostic outputs
///
/// All diagnostic logic lives upstream (Baseline, Scorer, Classifier);
/// the explainer only combines their results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Explainer;

impl Explainer {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the complete diagnostic output for one (instrument, date)
    pub fn explain(
        &self,
        regime_result: RegimeResult,
        scoring_result: Option<ScoringResult>,
        excluded_features: Vec<ExcludedFeature>,
        baseline_state: BaselineState,
        ticker: impl Into<String>,
        date: NaiveDate,
    ) -> DiagnosticOutput {
        DiagnosticOutput {
            regime_result,
            scoring_result,
            excluded_features,
            baseline_state,
            ticker: ticker.into(),
            date,
        }
    }
}
