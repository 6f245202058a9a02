//! Basalt Universe Management
//!
//! Decides, cycle by cycle, which instruments deserve diagnostic
//! treatment. Two-tier system:
//!
//! - **CORE**: always-active market structure nodes (SPY, QQQ, IWM, DIA)
//! - **FOCUS**: dynamic tickers that explain CORE behavior
//!
//! FOCUS membership is driven by three promotion triggers (structural
//! index weight, microstructure stress, calendar events), an inactivity
//! expiry (3 silent cycles), and a capacity cap (default 30) that never
//! evicts structural entries.
//!
//! The manager owns the only mutable state in the system (the FOCUS map)
//! and expects a single-writer discipline: all mutating calls go through
//! `&mut self`, serialized per evaluation cycle by the caller.

pub mod error;
pub mod events;
pub mod manager;
pub mod structural;

// Re-export main types
pub use error::{Error, Result};
pub use events::{
    fetch_all_events, fomc_events, CalendarSource, EarningsRow, EventEntry, EventType,
};
pub use manager::{
    FocusEntry, FocusReason, StressSignals, UniverseConfig, UniverseManager, UniverseState,
    CORE_TICKERS,
};
pub use structural::{
    deduplicate_constituents, fetch_all_structural_focus, structural_threshold, Holding,
    HoldingsSource, IndexConstituent,
};
