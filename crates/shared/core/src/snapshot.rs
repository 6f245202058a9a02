//! Per-day classification input
//!
//! An immutable snapshot of everything the regime rules look at for one
//! instrument on one date. Explicit fields (rather than dynamic maps) give
//! compile-time guarantees against silent key typos; any field may be
//! missing, and a rule with a missing required input is skipped entirely.

use serde::Serialize;

/// Immutable rule input for one (instrument, date)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureSnapshot {
    /// GEX z-score against the instrument's own baseline
    pub z_gex: Option<f64>,
    /// DEX z-score
    pub z_dex: Option<f64>,
    /// Block-intensity z-score
    pub z_block: Option<f64>,
    /// Raw dark pool share (0-1 proportion)
    pub dark_share: Option<f64>,
    /// Raw price efficiency
    pub efficiency: Option<f64>,
    /// Raw price impact
    pub impact: Option<f64>,
    /// Trailing median efficiency (63-day baseline)
    pub efficiency_median: Option<f64>,
    /// Trailing median impact (63-day baseline)
    pub impact_median: Option<f64>,
    /// Daily close-to-close return
    pub daily_return: Option<f64>,
    /// Whether the baseline state permits classification
    pub baseline_sufficient: bool,
}

impl FeatureSnapshot {
    /// Snapshot with everything missing and an insufficient baseline
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_z_gex(mut self, z: f64) -> Self {
        self.z_gex = Some(z);
        self
    }

    pub fn with_z_dex(mut self, z: f64) -> Self {
        self.z_dex = Some(z);
        self
    }

    pub fn with_z_block(mut self, z: f64) -> Self {
        self.z_block = Some(z);
        self
    }

    pub fn with_dark_share(mut self, share: f64) -> Self {
        self.dark_share = Some(share);
        self
    }

    pub fn with_efficiency(mut self, observed: f64, median: f64) -> Self {
        self.efficiency = Some(observed);
        self.efficiency_median = Some(median);
        self
    }

    pub fn with_impact(mut self, observed: f64, median: f64) -> Self {
        self.impact = Some(observed);
        self.impact_median = Some(median);
        self
    }

    pub fn with_daily_return(mut self, r: f64) -> Self {
        self.daily_return = Some(r);
        self
    }

    pub fn with_baseline_sufficient(mut self, sufficient: bool) -> Self {
        self.baseline_sufficient = sufficient;
        self
    }
}
