//! Basalt Diagnostic Engine
//!
//! Four-stage computation pipeline producing a daily, explainable
//! microstructure diagnosis for one instrument:
//!
//! ```text
//! FeatureSeries ──► Baseline ──► z-scores, medians, state
//!                      │
//!                      ├──► Scorer ──► raw score ──► percentile ──► band
//!                      │
//!                      └──► Classifier ──► regime (priority rules)
//!                                  │
//!                                  ▼
//!                              Explainer ──► DiagnosticOutput
//! ```
//!
//! Every stage is synchronous, single-threaded, and side-effect-free:
//! pure functions over in-memory series and maps, safely callable
//! concurrently as long as each call operates on one instrument's own
//! data. Missing values stay missing through the whole pipeline — the
//! engine never imputes, and degrades to Undetermined / `None` rather
//! than erroring when data is incomplete.

pub mod baseline;
pub mod classifier;
pub mod error;
pub mod explain;
pub mod scoring;

// Re-export main types
pub use baseline::{Baseline, BaselineState, BaselineStats};
pub use classifier::{Classifier, Condition, RegimeResult, RegimeType};
pub use error::{Error, Result};
pub use explain::{DiagnosticOutput, ExcludedFeature, Explainer};
pub use scoring::{InterpretationBand, Scorer, ScoringResult};
