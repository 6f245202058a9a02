//! Pipeline errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("engine error: {0}")]
    Engine(#[from] basalt_engine::Error),

    #[error("universe error: {0}")]
    Universe(#[from] basalt_universe::Error),

    #[error("feature store failed for {ticker}: {message}")]
    FeatureStore { ticker: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
