//! Basalt Pipeline
//!
//! Coordinates universe management and the diagnostic engine in a
//! two-pass daily cycle:
//!
//! ```text
//! Pass 1   structural + event promotion ──► FOCUS update
//!            │
//! Main       ▼
//!          active tickers ──► load features ──► evaluate (concurrent)
//!            │
//! Pass 2     ▼
//!          stress check ──► promote / expire / enforce cap
//! ```
//!
//! The engine stages are pure, so per-ticker evaluation fans out onto
//! the runtime freely; the only mutable state is the FOCUS map, touched
//! strictly before and after the concurrent section.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod processor;

// Re-export main types
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use ports::{FeaturePanel, FeatureStore};
pub use processor::{Evaluation, Processor};
