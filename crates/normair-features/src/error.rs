//! Error types for feature construction.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while building features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// A column required by the builder is absent from the input
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A timestamp could not be interpreted
    #[error("Invalid timestamp in column '{column}' at row {row}")]
    InvalidTimestamp {
        /// Timestamp column name
        column: String,
        /// Row position of the offending value
        row: usize,
    },

    /// The timestamp column has a type that cannot hold dates
    #[error("Unsupported timestamp type for column '{column}': {dtype}")]
    UnsupportedTimestampType {
        /// Timestamp column name
        column: String,
        /// Data type found in the column
        dtype: String,
    },

    /// Index and frame disagree on the number of rows
    #[error("Length mismatch: index has {index} rows, values have {values}")]
    LengthMismatch {
        /// Number of index entries
        index: usize,
        /// Number of value rows
        values: usize,
    },

    /// A harmonic period is not a positive finite number
    #[error("Invalid harmonic period: {0} (must be positive and finite)")]
    InvalidHarmonicPeriod(f64),
}
