//! Pipeline data port
//!
//! The processor consumes per-ticker feature panels through a narrow
//! async trait so storage backends (columnar cache, fixtures, in-memory
//! test stores) stay swappable without touching the evaluation path.

use std::collections::BTreeMap;

use async_trait::async_trait;
use basalt_core::{Feature, FeatureSeries};
use chrono::NaiveDate;

use crate::error::Result;

/// All feature history for one ticker over one lookback window
///
/// Features absent from the map simply never entered the diagnosis; the
/// engine degrades rather than erroring. Series are instrument-isolated
/// by construction (one panel per ticker, no pooling).
#[derive(Debug, Clone, Default)]
pub struct FeaturePanel {
    pub features: BTreeMap<Feature, FeatureSeries>,
    /// Close-to-close return on the evaluation date, when bars are
    /// available
    pub daily_return: Option<f64>,
}

impl FeaturePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, feature: Feature, series: FeatureSeries) -> Self {
        self.features.insert(feature, series);
        self
    }

    pub fn with_daily_return(mut self, r: f64) -> Self {
        self.daily_return = Some(r);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, feature: Feature) -> Option<&FeatureSeries> {
        self.features.get(&feature)
    }
}

/// Source of per-ticker feature history
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Load the feature panel for `ticker` ending at `end_date`,
    /// covering `lookback_days` calendar days
    async fn load_panel(
        &self,
        ticker: &str,
        end_date: NaiveDate,
        lookback_days: u64,
    ) -> Result<FeaturePanel>;
}
