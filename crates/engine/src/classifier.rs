//! Regime classification
//!
//! Priority-ordered deterministic rules that classify daily market
//! microstructure into one of seven mutually exclusive regimes. Rules are
//! evaluated top-to-bottom and the first satisfied rule wins — there is no
//! scoring of "best match". A rule with any missing required input is
//! skipped entirely, and boundary values (exactly at threshold) never
//! satisfy a rule.
//!
//! Thresholds are process-wide constants, never tuned per instrument. All
//! z-scores reference the instrument's own baseline.

use basalt_core::FeatureSnapshot;
use serde::{Deserialize, Serialize};

/// Z_GEX magnitude for the gamma regimes
pub const Z_GEX_THRESHOLD: f64 = 1.5;
/// Z_block floor for Dark-Dominant
pub const Z_BLOCK_THRESHOLD: f64 = 1.0;
/// Z_DEX magnitude for Absorption / Distribution
pub const Z_DEX_THRESHOLD: f64 = 1.0;
/// Dark share floor for Dark-Dominant (absolute proportion)
pub const DARK_SHARE_DD_THRESHOLD: f64 = 0.70;
/// Dark share floor for Absorption (absolute proportion)
pub const DARK_SHARE_ABS_THRESHOLD: f64 = 0.50;
/// Daily return floor for Absorption (>= -0.5%)
pub const PRICE_MOVE_ABS_CAP: f64 = -0.005;
/// Daily return cap for Distribution (<= +0.5%)
pub const PRICE_MOVE_DIST_CAP: f64 = 0.005;

/// Market microstructure regimes, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegimeType {
    /// Dealers long gamma, volatility suppression
    GammaPositive,
    /// Dealers short gamma, liquidity vacuum
    GammaNegative,
    /// Institutional dark pool accumulation
    DarkDominant,
    /// Sell pressure absorbed
    Absorption,
    /// Buy pressure distributed into strength
    Distribution,
    /// No dominant pattern
    Neutral,
    /// Insufficient data, diagnosis withheld
    Undetermined,
}

impl RegimeType {
    /// Short regime label
    pub fn label(&self) -> &'static str {
        match self {
            RegimeType::GammaPositive => "Γ⁺",
            RegimeType::GammaNegative => "Γ⁻",
            RegimeType::DarkDominant => "DD",
            RegimeType::Absorption => "ABS",
            RegimeType::Distribution => "DIST",
            RegimeType::Neutral => "NEU",
            RegimeType::Undetermined => "UND",
        }
    }

    /// Human-readable regime name
    pub fn description(&self) -> &'static str {
        match self {
            RegimeType::GammaPositive => "Gamma-Positive Control",
            RegimeType::GammaNegative => "Gamma-Negative Liquidity Vacuum",
            RegimeType::DarkDominant => "Dark-Dominant Accumulation",
            RegimeType::Absorption => "Absorption-Like",
            RegimeType::Distribution => "Distribution-Like",
            RegimeType::Neutral => "Neutral / Mixed",
            RegimeType::Undetermined => "Undetermined",
        }
    }

    /// Microstructure interpretation text
    pub fn interpretation(&self) -> &'static str {
        match self {
            RegimeType::GammaPositive => {
                "Dealers are significantly long gamma. Their hedging activity \
                 compresses the intraday range, resulting in below-normal price \
                 efficiency. Volatility suppression regime."
            }
            RegimeType::GammaNegative => {
                "Dealers are significantly short gamma. Their hedging amplifies \
                 directional moves. Above-normal price impact per unit volume \
                 signals a liquidity vacuum."
            }
            RegimeType::DarkDominant => {
                "More than 70% of volume is executing off-exchange, with \
                 block-print intensity elevated above +1σ. Consistent with \
                 institutional positioning via dark liquidity."
            }
            RegimeType::Absorption => {
                "Net delta exposure is significantly negative (sell pressure), \
                 but the daily close-to-close move is no worse than −0.5%, and \
                 dark pool participation exceeds 50%. Passive buying is absorbing \
                 the sell flow."
            }
            RegimeType::Distribution => {
                "Net delta exposure is significantly positive (buy pressure), \
                 but the daily move is no better than +0.5%. Supply is being \
                 distributed into strength without upside follow-through."
            }
            RegimeType::Neutral => {
                "No single microstructure pattern dominates. The instrument is \
                 in a balanced or ambiguous state."
            }
            RegimeType::Undetermined => "System cannot classify. Diagnosis withheld.",
        }
    }
}

impl std::fmt::Display for RegimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One literal (observed, threshold, satisfied) triple of a winning rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub observed: f64,
    pub threshold: f64,
    pub satisfied: bool,
}

impl Condition {
    /// A satisfied condition of the winning rule
    pub fn met(observed: f64, threshold: f64) -> Self {
        Self {
            observed,
            threshold,
            satisfied: true,
        }
    }
}

/// Result of regime classification with its triggering conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeResult {
    pub regime: RegimeType,
    /// Ordered (condition name, condition) pairs of the winning rule;
    /// empty for NEU and UND
    pub triggering_conditions: Vec<(&'static str, Condition)>,
    pub interpretation: &'static str,
    pub baseline_sufficient: bool,
}

impl RegimeResult {
    fn from_rule(
        regime: RegimeType,
        triggering_conditions: Vec<(&'static str, Condition)>,
    ) -> Self {
        Self {
            regime,
            triggering_conditions,
            interpretation: regime.interpretation(),
            baseline_sufficient: true,
        }
    }

    /// Format triggering conditions as human-readable lines,
    /// e.g. `Z_GEX = 2.1400 (threshold: 1.5000) ✓`
    pub fn format_conditions(&self) -> String {
        self.triggering_conditions
            .iter()
            .map(|(name, c)| {
                let symbol = if c.satisfied { "✓" } else { "✗" };
                format!(
                    "{} = {:.4} (threshold: {:.4}) {}",
                    name, c.observed, c.threshold, symbol
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A rule returns the regime and its literal conditions when satisfied
type Rule = fn(&FeatureSnapshot) -> Option<RegimeResult>;

/// Priority 1: Z_GEX > +1.5 AND efficiency < baseline median efficiency
fn gamma_positive(s: &FeatureSnapshot) -> Option<RegimeResult> {
    let z_gex = s.z_gex?;
    let efficiency = s.efficiency?;
    let median = s.efficiency_median?;

    (z_gex > Z_GEX_THRESHOLD && efficiency < median).then(|| {
        RegimeResult::from_rule(
            RegimeType::GammaPositive,
            vec![
                ("Z_GEX", Condition::met(z_gex, Z_GEX_THRESHOLD)),
                ("Efficiency_vs_median", Condition::met(efficiency, median)),
            ],
        )
    })
}

/// Priority 2: Z_GEX < -1.5 AND impact > baseline median impact
fn gamma_negative(s: &FeatureSnapshot) -> Option<RegimeResult> {
    let z_gex = s.z_gex?;
    let impact = s.impact?;
    let median = s.impact_median?;

    (z_gex < -Z_GEX_THRESHOLD && impact > median).then(|| {
        RegimeResult::from_rule(
            RegimeType::GammaNegative,
            vec![
                ("Z_GEX", Condition::met(z_gex, -Z_GEX_THRESHOLD)),
                ("Impact_vs_median", Condition::met(impact, median)),
            ],
        )
    })
}

/// Priority 3: dark_share > 0.70 AND Z_block > +1.0
fn dark_dominant(s: &FeatureSnapshot) -> Option<RegimeResult> {
    let dark_share = s.dark_share?;
    let z_block = s.z_block?;

    (dark_share > DARK_SHARE_DD_THRESHOLD && z_block > Z_BLOCK_THRESHOLD).then(|| {
        RegimeResult::from_rule(
            RegimeType::DarkDominant,
            vec![
                ("DarkShare", Condition::met(dark_share, DARK_SHARE_DD_THRESHOLD)),
                ("Z_block", Condition::met(z_block, Z_BLOCK_THRESHOLD)),
            ],
        )
    })
}

/// Priority 4: Z_DEX < -1.0 AND return >= -0.005 AND dark_share > 0.50
fn absorption(s: &FeatureSnapshot) -> Option<RegimeResult> {
    let z_dex = s.z_dex?;
    let daily_return = s.daily_return?;
    let dark_share = s.dark_share?;

    (z_dex < -Z_DEX_THRESHOLD
        && daily_return >= PRICE_MOVE_ABS_CAP
        && dark_share > DARK_SHARE_ABS_THRESHOLD)
        .then(|| {
            RegimeResult::from_rule(
                RegimeType::Absorption,
                vec![
                    ("Z_DEX", Condition::met(z_dex, -Z_DEX_THRESHOLD)),
                    ("Daily_return", Condition::met(daily_return, PRICE_MOVE_ABS_CAP)),
                    ("DarkShare", Condition::met(dark_share, DARK_SHARE_ABS_THRESHOLD)),
                ],
            )
        })
}

/// Priority 5: Z_DEX > +1.0 AND return <= +0.005
fn distribution(s: &FeatureSnapshot) -> Option<RegimeResult> {
    let z_dex = s.z_dex?;
    let daily_return = s.daily_return?;

    (z_dex > Z_DEX_THRESHOLD && daily_return <= PRICE_MOVE_DIST_CAP).then(|| {
        RegimeResult::from_rule(
            RegimeType::Distribution,
            vec![
                ("Z_DEX", Condition::met(z_dex, Z_DEX_THRESHOLD)),
                ("Daily_return", Condition::met(daily_return, PRICE_MOVE_DIST_CAP)),
            ],
        )
    })
}

/// Declarative priority chain; first satisfied rule wins
const RULES: [Rule; 5] = [
    gamma_positive,
    gamma_negative,
    dark_dominant,
    absorption,
    distribution,
];

/// Regime classifier over a priority-ordered rule list
///
/// Classification is a pure function of the snapshot: identical inputs
/// always produce identical results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a single day's snapshot
    ///
    /// Short-circuits to Undetermined before rule 1 when the baseline is
    /// insufficient; falls through to Neutral when no rule matches.
    pub fn classify(&self, snapshot: &FeatureSnapshot) -> RegimeResult {
        if !snapshot.baseline_sufficient {
            return RegimeResult {
                regime: RegimeType::Undetermined,
                triggering_conditions: Vec::new(),
                interpretation: RegimeType::Undetermined.interpretation(),
                baseline_sufficient: false,
            };
        }

        RULES
            .iter()
            .find_map(|rule| rule(snapshot))
            .unwrap_or_else(|| {
                RegimeResult::from_rule(RegimeType::Neutral, Vec::new())
            })
    }
}
