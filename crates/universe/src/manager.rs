//! CORE/FOCUS universe manager
//!
//! Per-ticker lifecycle:
//!
//! ```text
//! NotTracked ──promote──► FOCUS ──re-trigger──► FOCUS (inactivity reset)
//!                           │
//!                           ├── 3 silent cycles ──► removed (expiry)
//!                           └── over cap, lowest rank ──► removed (eviction)
//! ```
//!
//! CORE never transitions, and CORE tickers are never promoted into FOCUS
//! (CORE ∩ FOCUS = ∅ is an invariant).

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::structural::structural_threshold;

/// CORE tickers — always active, never promoted or evicted
pub const CORE_TICKERS: [&str; 4] = ["SPY", "QQQ", "IWM", "DIA"];

/// Why a ticker entered FOCUS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusReason {
    /// Top index weight in a tracked ETF
    Structural,
    /// Microstructure stress from the diagnostic pipeline
    Stress,
    /// Earnings / macro / FOMC calendar proximity
    Event,
}

impl FocusReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusReason::Structural => "structural",
            FocusReason::Stress => "stress",
            FocusReason::Event => "event",
        }
    }
}

/// FOCUS membership record for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusEntry {
    pub ticker: String,
    pub entry_date: NaiveDate,
    pub reason: FocusReason,
    pub details: String,
    /// Consecutive cycles without any entry condition firing
    pub days_inactive: u32,
}

/// Stress signals derived from the pipeline's own scoring/classification
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StressSignals {
    /// Unusualness percentile score (0-100)
    pub unusualness: Option<f64>,
    pub z_gex: Option<f64>,
    /// Raw dark pool share (0-1)
    pub dark_share: Option<f64>,
    pub z_block: Option<f64>,
}

impl StressSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unusualness(mut self, u: f64) -> Self {
        self.unusualness = Some(u);
        self
    }

    pub fn with_z_gex(mut self, z: f64) -> Self {
        self.z_gex = Some(z);
        self
    }

    pub fn with_dark_share(mut self, share: f64) -> Self {
        self.dark_share = Some(share);
        self
    }

    pub fn with_z_block(mut self, z: f64) -> Self {
        self.z_block = Some(z);
        self
    }

    /// Whether any stress entry condition fires under the given
    /// thresholds. Missing signals never fire.
    pub fn is_stressed(&self, config: &UniverseConfig) -> bool {
        self.unusualness
            .is_some_and(|u| u >= config.stress_unusualness)
            || self.z_gex.is_some_and(|z| z.abs() >= config.stress_z_gex)
            || self
                .dark_share
                .is_some_and(|s| s >= config.stress_dark_share)
            || self.z_block.is_some_and(|z| z.abs() >= config.stress_z_block)
    }
}

/// Tunable universe parameters
#[derive(Debug, Clone)]
pub struct UniverseConfig {
    /// Maximum FOCUS size after cap enforcement
    pub max_focus: usize,
    /// Consecutive silent cycles before expiry
    pub expiry_threshold: u32,
    /// Stress trigger: unusualness score floor
    pub stress_unusualness: f64,
    /// Stress trigger: |Z_GEX| floor
    pub stress_z_gex: f64,
    /// Stress trigger: dark share floor
    pub stress_dark_share: f64,
    /// Stress trigger: |Z_block| floor
    pub stress_z_block: f64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            max_focus: 30,
            expiry_threshold: 3,
            stress_unusualness: 70.0,
            stress_z_gex: 2.0,
            stress_dark_share: 0.65,
            stress_z_block: 2.0,
        }
    }
}

/// Current state of the universe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseState {
    core: BTreeSet<String>,
    focus: HashMap<String, FocusEntry>,
}

impl Default for UniverseState {
    fn default() -> Self {
        Self {
            core: CORE_TICKERS.iter().map(|t| t.to_string()).collect(),
            focus: HashMap::new(),
        }
    }
}

impl UniverseState {
    /// All active tickers (CORE + FOCUS), sorted
    pub fn all_tickers(&self) -> BTreeSet<String> {
        self.core
            .iter()
            .chain(self.focus.keys())
            .cloned()
            .collect()
    }

    pub fn is_core(&self, ticker: &str) -> bool {
        self.core.contains(&ticker.to_uppercase())
    }

    pub fn is_focus(&self, ticker: &str) -> bool {
        self.focus.contains_key(&ticker.to_uppercase())
    }
}

/// Manages CORE and FOCUS universe membership
///
/// All mutating calls take `&mut self`; callers serialize them per
/// evaluation cycle (single-writer discipline).
#[derive(Debug, Clone, Default)]
pub struct UniverseManager {
    state: UniverseState,
    config: UniverseConfig,
}

impl UniverseManager {
    /// Initialize with CORE tickers only and default parameters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: UniverseConfig) -> Self {
        Self {
            state: UniverseState::default(),
            config,
        }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// All currently active tickers (CORE + FOCUS), sorted
    pub fn get_active_tickers(&self) -> BTreeSet<String> {
        self.state.all_tickers()
    }

    /// The fixed CORE set
    pub fn get_core_tickers(&self) -> &BTreeSet<String> {
        &self.state.core
    }

    /// Current FOCUS tickers with entry metadata
    pub fn get_focus_tickers(&self) -> &HashMap<String, FocusEntry> {
        &self.state.focus
    }

    /// Re-promotion is a membership no-op that resets inactivity.
    /// Returns true when the ticker was already in FOCUS.
    fn touch_existing(&mut self, ticker: &str) -> bool {
        if let Some(entry) = self.state.focus.get_mut(ticker) {
            entry.days_inactive = 0;
            true
        } else {
            false
        }
    }

    fn insert_focus(
        &mut self,
        ticker: String,
        entry_date: NaiveDate,
        reason: FocusReason,
        details: String,
    ) {
        log::info!(
            "FOCUS promote {} ({}: {})",
            ticker,
            reason.as_str(),
            details
        );
        self.state.focus.insert(
            ticker.clone(),
            FocusEntry {
                ticker,
                entry_date,
                reason,
                details,
                days_inactive: 0,
            },
        );
    }

    /// Promote a ticker based on its index weight rank.
    ///
    /// Thresholds: SPY top 15, QQQ top 10, DIA top 10; IWM contributes
    /// nothing. Returns true iff a new FOCUS entry was created.
    pub fn promote_structural(
        &mut self,
        ticker: &str,
        etf: &str,
        rank: u32,
        entry_date: NaiveDate,
    ) -> bool {
        let ticker = ticker.to_uppercase();
        if self.state.is_core(&ticker) {
            return false;
        }
        if self.touch_existing(&ticker) {
            return false;
        }

        let etf = etf.to_uppercase();
        let Some(threshold) = structural_threshold(&etf) else {
            return false;
        };
        if rank > threshold {
            return false;
        }

        let details = format!("Rank {} in {}", rank, etf);
        self.insert_focus(ticker, entry_date, FocusReason::Structural, details);
        true
    }

    /// Promote a ticker whose microstructure is stressed.
    ///
    /// Any one condition suffices: unusualness >= 70, |Z_GEX| >= 2.0,
    /// dark_share >= 0.65, |Z_block| >= 2.0. Returns true iff a new FOCUS
    /// entry was created; re-triggering an existing entry only resets its
    /// inactivity counter.
    pub fn promote_if_stressed(
        &mut self,
        ticker: &str,
        signals: &StressSignals,
        entry_date: NaiveDate,
    ) -> bool {
        let ticker = ticker.to_uppercase();

        let mut reasons = Vec::new();
        if let Some(u) = signals.unusualness {
            if u >= self.config.stress_unusualness {
                reasons.push(format!("U={:.1}", u));
            }
        }
        if let Some(z) = signals.z_gex {
            if z.abs() >= self.config.stress_z_gex {
                reasons.push(format!("Z_GEX={:+.1}", z));
            }
        }
        if let Some(share) = signals.dark_share {
            if share >= self.config.stress_dark_share {
                reasons.push(format!("DarkShare={:.0}%", share * 100.0));
            }
        }
        if let Some(z) = signals.z_block {
            if z.abs() >= self.config.stress_z_block {
                reasons.push(format!("Z_block={:+.1}", z));
            }
        }

        if reasons.is_empty() {
            return false;
        }
        if self.state.is_core(&ticker) {
            return false;
        }
        if self.touch_existing(&ticker) {
            return false;
        }

        self.insert_focus(ticker, entry_date, FocusReason::Stress, reasons.join(", "));
        true
    }

    /// Promote a ticker due to a nearby calendar event.
    ///
    /// Returns true iff a new FOCUS entry was created.
    pub fn promote_event(
        &mut self,
        ticker: &str,
        event_description: &str,
        entry_date: NaiveDate,
    ) -> bool {
        let ticker = ticker.to_uppercase();
        if self.state.is_core(&ticker) {
            return false;
        }
        if self.touch_existing(&ticker) {
            return false;
        }

        self.insert_focus(
            ticker,
            entry_date,
            FocusReason::Event,
            event_description.to_string(),
        );
        true
    }

    /// Reset the inactivity counter for a ticker that met an entry
    /// condition this cycle
    pub fn mark_active(&mut self, ticker: &str) {
        self.touch_existing(&ticker.to_uppercase());
    }

    /// Increment the inactivity counter for a ticker that met no entry
    /// condition this cycle (once per silent cycle)
    pub fn increment_inactive(&mut self, ticker: &str) {
        if let Some(entry) = self.state.focus.get_mut(&ticker.to_uppercase()) {
            entry.days_inactive += 1;
        }
    }

    /// Remove FOCUS tickers inactive for the configured threshold of
    /// consecutive cycles. Returns the removed tickers.
    pub fn expire_inactive(&mut self) -> BTreeSet<String> {
        let threshold = self.config.expiry_threshold;
        let removed: BTreeSet<String> = self
            .state
            .focus
            .iter()
            .filter(|(_, entry)| entry.days_inactive >= threshold)
            .map(|(ticker, _)| ticker.clone())
            .collect();

        for ticker in &removed {
            log::info!("FOCUS expire {} (inactive >= {})", ticker, threshold);
            self.state.focus.remove(ticker);
        }

        removed
    }

    /// Enforce the FOCUS capacity cap.
    ///
    /// Structural entries are always kept. The remaining slots go to
    /// non-structural entries ranked by (unusualness desc, |Z_GEX| desc);
    /// the lowest-ranked excess is evicted. If structural entries alone
    /// reach the cap, nothing is evicted — the cap is a soft ceiling that
    /// never violates the structural guarantee.
    pub fn enforce_focus_cap(
        &mut self,
        scores: &HashMap<String, f64>,
        z_gex_values: &HashMap<String, f64>,
    ) -> BTreeSet<String> {
        let max_focus = self.config.max_focus;
        if self.state.focus.len() <= max_focus {
            return BTreeSet::new();
        }

        let structural_count = self
            .state
            .focus
            .values()
            .filter(|e| e.reason == FocusReason::Structural)
            .count();

        if structural_count >= max_focus {
            return BTreeSet::new();
        }
        let slots = max_focus - structural_count;

        let mut non_structural: Vec<String> = self
            .state
            .focus
            .iter()
            .filter(|(_, e)| e.reason != FocusReason::Structural)
            .map(|(t, _)| t.clone())
            .collect();

        // Rank: unusualness desc, |Z_GEX| desc, ticker as final tie-break
        non_structural.sort_by(|a, b| {
            let key = |t: &String| {
                (
                    scores.get(t).copied().unwrap_or(0.0),
                    z_gex_values.get(t).copied().unwrap_or(0.0).abs(),
                )
            };
            let (sa, za) = key(a);
            let (sb, zb) = key(b);
            sb.partial_cmp(&sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(zb.partial_cmp(&za).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.cmp(b))
        });

        let removed: BTreeSet<String> = non_structural.split_off(slots).into_iter().collect();
        for ticker in &removed {
            log::info!("FOCUS evict {} (over cap {})", ticker, max_focus);
            self.state.focus.remove(ticker);
        }

        removed
    }

    /// Clear all FOCUS tickers (CORE stays intact)
    pub fn reset_focus(&mut self) {
        self.state.focus.clear();
    }
}
