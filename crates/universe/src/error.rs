//! Universe management errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("holdings source failed for {etf}: {message}")]
    HoldingsSource { etf: String, message: String },

    #[error("calendar source failed: {0}")]
    CalendarSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
