//! Supported model kinds.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumerates the regression models that can back a [`crate::ScoringModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Regression tree ensemble
    #[default]
    RandomForest,
}

impl ModelKind {
    /// Canonical name used in configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random_forest" => Ok(Self::RandomForest),
            other => Err(ModelError::UnsupportedModelKind(other.to_string())),
        }
    }
}
