//! Error types for model construction, fitting and prediction.

use normair_features::FeatureError;
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur in scoring models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The requested model kind is not supported
    #[error("Unsupported model kind: {0}")]
    UnsupportedModelKind(String),

    /// The model was configured inconsistently
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Selected features are absent from the feature matrix
    #[error("Feature selection failed, missing columns: {}", missing.join(", "))]
    FeatureSelection {
        /// Names of the absent columns
        missing: Vec<String>,
    },

    /// Prediction was requested before fitting
    #[error("Model has not been fitted")]
    NotFitted,

    /// Feature matrix error
    #[error(transparent)]
    Feature(#[from] FeatureError),
}
