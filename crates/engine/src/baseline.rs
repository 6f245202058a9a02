//! Rolling self-baseline statistics
//!
//! Per-feature rolling mean, sample standard deviation, and median over a
//! trailing window (default 63 trading days), with an expanding window
//! during cold start. A feature's statistics are valid only once at least
//! `min_periods` (default 21) non-missing observations are in the window.
//!
//! Invariant: the baseline never imputes or forward-fills. Missing stays
//! missing through z-scores and everything downstream — false negatives
//! are preferred over false confidence.

use std::collections::HashMap;

use basalt_core::{Feature, FeatureSeries};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default rolling window (trading days)
pub const DEFAULT_WINDOW: usize = 63;
/// Default minimum non-missing observations for a valid baseline
pub const DEFAULT_MIN_PERIODS: usize = 21;
/// Default relative drift detection threshold
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.10;

/// Baseline validity across all tracked features of one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineState {
    /// No feature meets min_periods — no diagnosis
    Empty,
    /// Some features valid, some not — conditional diagnosis
    Partial,
    /// All features meet min_periods — full confidence
    Complete,
}

impl BaselineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaselineState::Empty => "EMPTY",
            BaselineState::Partial => "PARTIAL",
            BaselineState::Complete => "COMPLETE",
        }
    }

    /// Whether classification may proceed at all
    pub fn is_sufficient(&self) -> bool {
        !matches!(self, BaselineState::Empty)
    }
}

impl std::fmt::Display for BaselineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rolling baseline statistics for one feature at one date
///
/// Statistics are `None` (and `is_valid` false) when fewer than
/// `min_periods` non-missing observations are in the window, regardless of
/// whatever numbers could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Rolling mean over non-missing values
    pub mean: Option<f64>,
    /// Rolling sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    /// Rolling median over non-missing values
    pub median: Option<f64>,
    /// Count of non-missing observations in the window
    pub n_valid: usize,
    /// True iff n_valid >= min_periods
    pub is_valid: bool,
}

impl BaselineStats {
    fn invalid(n_valid: usize) -> Self {
        Self {
            mean: None,
            std: None,
            median: None,
            n_valid,
            is_valid: false,
        }
    }
}

/// Baseline computation engine with expanding-window cold start
///
/// At index i, if expanding and `i < window` the window is all observations
/// from the series start through i; otherwise the trailing `window`
/// observations ending at i.
#[derive(Debug, Clone)]
pub struct Baseline {
    window: usize,
    min_periods: usize,
    drift_threshold: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            min_periods: DEFAULT_MIN_PERIODS,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
        }
    }
}

impl Baseline {
    /// Create a baseline engine, rejecting malformed parameters fail-fast
    pub fn new(window: usize, min_periods: usize, drift_threshold: f64) -> Result<Self> {
        if min_periods < 2 {
            return Err(Error::MinPeriodsTooSmall(min_periods));
        }
        if window < min_periods {
            return Err(Error::WindowTooSmall {
                window,
                min_periods,
            });
        }
        if !(drift_threshold > 0.0 && drift_threshold <= 1.0) {
            return Err(Error::InvalidDriftThreshold(drift_threshold));
        }
        Ok(Self {
            window,
            min_periods,
            drift_threshold,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Window bounds for index i: `[start, i]` inclusive
    fn window_start(&self, i: usize, expanding: bool) -> usize {
        if expanding && i < self.window {
            0
        } else {
            (i + 1).saturating_sub(self.window)
        }
    }

    /// Compute rolling statistics for every index of the series
    pub fn statistics(&self, series: &FeatureSeries, expanding: bool) -> Vec<BaselineStats> {
        let observations = series.observations();
        let mut stats = Vec::with_capacity(observations.len());

        for i in 0..observations.len() {
            let start = self.window_start(i, expanding);
            let mut values: Vec<f64> = observations[start..=i]
                .iter()
                .filter_map(|o| o.value)
                .collect();

            if values.len() < self.min_periods {
                stats.push(BaselineStats::invalid(values.len()));
                continue;
            }

            let n = values.len();
            let mean = values.iter().sum::<f64>() / n as f64;
            let variance =
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            let std = variance.sqrt();

            values.sort_by(f64::total_cmp);
            let median = if n % 2 == 1 {
                values[n / 2]
            } else {
                (values[n / 2 - 1] + values[n / 2]) / 2.0
            };

            stats.push(BaselineStats {
                mean: Some(mean),
                std: Some(std),
                median: Some(median),
                n_valid: n,
                is_valid: true,
            });
        }

        stats
    }

    /// Compute z-scores for every index of the series
    ///
    /// `Z(t) = (x_t - mean) / std`. The z-score is `None` wherever the
    /// input is missing, fewer than `min_periods` valid observations are in
    /// the window, or the window std is exactly 0 (guarded, never panics).
    pub fn z_scores(&self, series: &FeatureSeries, expanding: bool) -> Vec<Option<f64>> {
        let stats = self.statistics(series, expanding);

        series
            .values()
            .zip(stats.iter())
            .map(|(value, s)| match (value, s.mean, s.std) {
                (Some(v), Some(mean), Some(std)) if std != 0.0 => Some((v - mean) / std),
                _ => None,
            })
            .collect()
    }

    /// Determine baseline state from per-feature valid-observation counts
    pub fn state(&self, feature_counts: &HashMap<Feature, usize>) -> BaselineState {
        if feature_counts.is_empty() {
            return BaselineState::Empty;
        }

        let valid = feature_counts
            .values()
            .filter(|&&n| n >= self.min_periods)
            .count();

        if valid == feature_counts.len() {
            BaselineState::Complete
        } else if valid > 0 {
            BaselineState::Partial
        } else {
            BaselineState::Empty
        }
    }

    /// Detect baseline drift between consecutive periods
    ///
    /// `|(mean_t - mean_{t-1}) / mean_{t-1}| > threshold`. Missing inputs
    /// never signal drift; a zero previous mean drifts iff current != 0.
    pub fn detect_drift(&self, current_mean: Option<f64>, previous_mean: Option<f64>) -> bool {
        let (Some(current), Some(previous)) = (current_mean, previous_mean) else {
            return false;
        };
        if !current.is_finite() || !previous.is_finite() {
            return false;
        }
        if previous == 0.0 {
            return current != 0.0;
        }

        ((current - previous) / previous).abs() > self.drift_threshold
    }

    /// Features below min_periods, sorted by count ascending
    pub fn excluded_features(
        &self,
        feature_counts: &HashMap<Feature, usize>,
    ) -> Vec<(Feature, usize)> {
        let mut excluded: Vec<(Feature, usize)> = feature_counts
            .iter()
            .filter(|&(_, &n)| n < self.min_periods)
            .map(|(&f, &n)| (f, n))
            .collect();
        excluded.sort_by_key(|&(f, n)| (n, f));
        excluded
    }
}
