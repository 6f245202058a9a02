//! Feature taxonomy
//!
//! The engineered daily features the diagnostic engine consumes. Five of
//! them carry a scoring weight (the "weighted" subset); efficiency and
//! impact are classifier inputs only, benchmarked against their own
//! rolling medians.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engineered daily feature for one instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Dealer net gamma exposure (signed, from options aggregation)
    Gex,
    /// Dealer net delta exposure (signed, from options aggregation)
    Dex,
    /// Fraction of volume executed off public exchanges
    DarkShare,
    /// Large-print intensity in off-exchange flow
    BlockIntensity,
    /// Execution venue distribution deviation
    VenueMix,
    /// Implied volatility rank (1-year percentile)
    IvRank,
    /// Price efficiency (range realized per unit volume)
    Efficiency,
    /// Price impact per unit volume
    Impact,
}

impl Feature {
    /// All tracked features, in canonical order
    pub const ALL: [Feature; 8] = [
        Feature::Gex,
        Feature::Dex,
        Feature::DarkShare,
        Feature::BlockIntensity,
        Feature::VenueMix,
        Feature::IvRank,
        Feature::Efficiency,
        Feature::Impact,
    ];

    /// Features that carry a scoring weight
    pub const WEIGHTED: [Feature; 5] = [
        Feature::DarkShare,
        Feature::Gex,
        Feature::VenueMix,
        Feature::BlockIntensity,
        Feature::IvRank,
    ];

    /// Canonical snake_case name (stable across serialization)
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Gex => "gex",
            Feature::Dex => "dex",
            Feature::DarkShare => "dark_share",
            Feature::BlockIntensity => "block_intensity",
            Feature::VenueMix => "venue_mix",
            Feature::IvRank => "iv_rank",
            Feature::Efficiency => "efficiency",
            Feature::Impact => "impact",
        }
    }

    /// Upper-case label used in human-readable driver listings
    pub fn label(&self) -> &'static str {
        match self {
            Feature::Gex => "GEX",
            Feature::Dex => "DEX",
            Feature::DarkShare => "DARK_SHARE",
            Feature::BlockIntensity => "BLOCK_INTENSITY",
            Feature::VenueMix => "VENUE_MIX",
            Feature::IvRank => "IV_RANK",
            Feature::Efficiency => "EFFICIENCY",
            Feature::Impact => "IMPACT",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
