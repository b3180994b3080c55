//! Error types shared across the crate.
//!
//! The core never substitutes defaults for malformed numeric input: every
//! entry point validates its arguments and returns one of these variants
//! instead of producing a statistically meaningless result.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input: wrong dimensionality, all-NaN signal, empty data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two arrays that must agree in shape do not.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Not enough observations for the requested statistic.
    #[error("insufficient data: need at least {required} subjects, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Missing or unrecognised analysis parameter.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
