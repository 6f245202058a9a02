//! Diagnostic engine errors
//!
//! Only malformed construction parameters are errors. Insufficient data is
//! never an error — it surfaces as baseline state and exclusion reasons in
//! the diagnostic output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("window ({window}) must be >= min_periods ({min_periods})")]
    WindowTooSmall { window: usize, min_periods: usize },

    #[error("min_periods ({0}) must be >= 2 for sample std")]
    MinPeriodsTooSmall(usize),

    #[error("drift threshold ({0}) must be in (0, 1]")]
    InvalidDriftThreshold(f64),

    #[error("percentile window ({0}) must be >= 1")]
    InvalidWindow(usize),

    #[error("feature weights sum to {0:.3}, expected ~1.0")]
    InvalidWeights(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
