//! Pipeline configuration

use basalt_engine::baseline::{DEFAULT_DRIFT_THRESHOLD, DEFAULT_MIN_PERIODS, DEFAULT_WINDOW};
use basalt_universe::events::DEFAULT_EVENT_WINDOW_DAYS;
use basalt_universe::UniverseConfig;

/// Tunable pipeline parameters
///
/// Defaults match the documented operating point: 63-day baseline with a
/// 21-observation validity floor, 100 calendar days of lookback (enough
/// trading days to fill the window), ±1 day event windows.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Rolling baseline window (trading days)
    pub window: usize,
    /// Minimum non-missing observations for a valid baseline
    pub min_periods: usize,
    /// Relative drift detection threshold
    pub drift_threshold: f64,
    /// Calendar days of history loaded per evaluation
    pub lookback_days: u64,
    /// Days on each side of the target date for calendar events
    pub event_window_days: i64,
    /// Universe promotion / expiry / cap parameters
    pub universe: UniverseConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            min_periods: DEFAULT_MIN_PERIODS,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            lookback_days: 100,
            event_window_days: DEFAULT_EVENT_WINDOW_DAYS,
            universe: UniverseConfig::default(),
        }
    }
}
