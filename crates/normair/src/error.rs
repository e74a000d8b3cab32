//! Error types for normalization runs.

use normair_features::FeatureError;
use normair_model::ModelError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Result type for normalization operations.
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Errors raised while normalizing a sensor's readings.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Feature construction failed
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    /// Model construction, fitting or prediction failed
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Configuration could not be parsed or is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A prediction draw does not cover the same timestamps as the first one
    #[error("Draw {draw} is not aligned with the first draw")]
    MisalignedDraw {
        /// Position of the offending draw
        draw: usize,
    },
}

impl From<serde_json::Error> for NormalizeError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfiguration(err.to_string())
    }
}
