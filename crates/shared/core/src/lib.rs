//! Basalt Core Domain
//!
//! Pure domain types for the Basalt microstructure diagnostics system.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod feature;
pub mod series;
pub mod snapshot;

// Re-export commonly used types at crate root
pub use feature::Feature;
pub use series::{FeatureSeries, Observation};
pub use snapshot::FeatureSnapshot;
