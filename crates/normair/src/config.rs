//! Normalization Configuration
//!
//! Deserialized from JSON; every field has a default, so `{}` is a valid
//! configuration.

use crate::error::Result;
use normair_features::FeatureConfig;
use normair_features::schema::{SENSOR_ID, TIME_INDEX, VALUE, weather_columns};
use normair_model::{FeatureSelection, ForestConfig, ModelKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source of randomness for training and resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngMode {
    /// Reproducible: the forest is trained with this seed and draw `i` uses
    /// stream `i` of a ChaCha8 generator seeded with it
    Seeded(u64),
    /// Every run and every draw is seeded from the operating system
    #[default]
    Entropy,
}

impl RngMode {
    /// Generator for prediction draw `draw`.
    pub fn draw_rng(&self, draw: u64) -> ChaCha8Rng {
        match self {
            Self::Seeded(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(*seed);
                rng.set_stream(draw);
                rng
            }
            Self::Entropy => ChaCha8Rng::from_entropy(),
        }
    }

    /// Seed for growing the forest.
    pub fn training_seed(&self) -> u64 {
        match self {
            Self::Seeded(seed) => *seed,
            Self::Entropy => rand::random(),
        }
    }
}

/// Which selected features are resampled at prediction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleScope {
    /// Only the weather covariates; calendar position is kept
    #[default]
    Weather,
    /// Every selected feature except the time index
    AllButTimeIndex,
}

/// Configuration of a normalization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Number of extra draws; `B + 1` predictions are averaged
    pub bootstrap_samples: usize,
    /// Randomness mode
    pub rng: RngMode,
    /// Model kind, e.g. `"random_forest"`
    pub model_kind: String,
    /// Forest hyperparameters
    pub forest: ForestConfig,
    /// Weather covariate columns used by the model
    pub weather_columns: Vec<String>,
    /// Pollutant value column
    pub target_column: String,
    /// Sensor identifier column
    pub sensor_column: String,
    /// Resampled feature set
    pub resample_scope: ResampleScope,
    /// Feature construction settings
    pub features: FeatureConfig,
    /// Run draws and sensors on the rayon pool
    pub parallel: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            bootstrap_samples: 100,
            rng: RngMode::default(),
            model_kind: ModelKind::RandomForest.to_string(),
            forest: ForestConfig::default(),
            weather_columns: weather_columns(),
            target_column: VALUE.to_string(),
            sensor_column: SENSOR_ID.to_string(),
            resample_scope: ResampleScope::default(),
            features: FeatureConfig::default(),
            parallel: true,
        }
    }
}

impl NormalizationConfig {
    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::NormalizeError::InvalidConfiguration(format!(
                "cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_json(&text)
    }

    /// The configured model kind.
    pub fn kind(&self) -> Result<ModelKind> {
        Ok(self.model_kind.parse()?)
    }

    /// Feature selection for the normalization model: time index, compact
    /// calendar and weather covariates, resampling per [`ResampleScope`].
    pub fn selection(&self) -> Result<FeatureSelection> {
        let selection = FeatureSelection::compact_for(&self.weather_columns);
        let bootstrap = match self.resample_scope {
            ResampleScope::Weather => self.weather_columns.clone(),
            ResampleScope::AllButTimeIndex => selection
                .features()
                .iter()
                .filter(|f| f.as_str() != TIME_INDEX)
                .cloned()
                .collect(),
        };
        Ok(selection.with_bootstrap(bootstrap)?)
    }

    /// Forest configuration with the training seed of the current rng mode.
    pub fn seeded_forest(&self) -> ForestConfig {
        ForestConfig {
            seed: self.rng.training_seed(),
            ..self.forest
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizeError;
    use normair_model::ModelError;
    use rand::RngCore;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = NormalizationConfig::default();
        assert_eq!(config.bootstrap_samples, 100);
        assert_eq!(config.rng, RngMode::Entropy);
        assert_eq!(config.kind().unwrap(), ModelKind::RandomForest);
        assert_eq!(config.forest.n_trees, 20);
        assert!(config.parallel);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(NormalizationConfig::from_json("{}").unwrap(), NormalizationConfig::default());
    }

    #[test]
    fn test_json_overrides() {
        let config = NormalizationConfig::from_json(
            r#"{"bootstrap_samples": 5, "rng": {"seeded": 7}, "resample_scope": "all_but_time_index", "forest": {"n_trees": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.bootstrap_samples, 5);
        assert_eq!(config.rng, RngMode::Seeded(7));
        assert_eq!(config.resample_scope, ResampleScope::AllButTimeIndex);
        assert_eq!(config.forest.n_trees, 3);
        assert_eq!(config.forest.min_samples_split, 2);
    }

    #[rstest]
    #[case(r#""entropy""#, RngMode::Entropy)]
    #[case(r#"{"seeded": 3}"#, RngMode::Seeded(3))]
    fn test_rng_mode_json(#[case] json: &str, #[case] expected: RngMode) {
        assert_eq!(serde_json::from_str::<RngMode>(json).unwrap(), expected);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            NormalizationConfig::from_json("{\"bootstrap_samples\": -1}"),
            Err(NormalizeError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_unsupported_kind() {
        let config = NormalizationConfig {
            model_kind: "svr".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.kind(),
            Err(NormalizeError::Model(ModelError::UnsupportedModelKind(_)))
        ));
    }

    #[test]
    fn test_selection_scopes() {
        let weather = NormalizationConfig::default().selection().unwrap();
        assert_eq!(weather.bootstrap_features(), weather_columns().as_slice());
        // normalization drops the weekday and month indicators
        assert!(!weather.features().iter().any(|f| f == "Monday" || f == "January"));

        let all = NormalizationConfig {
            resample_scope: ResampleScope::AllButTimeIndex,
            ..Default::default()
        }
        .selection()
        .unwrap();
        assert_eq!(all.bootstrap_features().len(), all.features().len() - 1);
        assert!(!all.bootstrap_features().iter().any(|f| f == TIME_INDEX));
    }

    #[test]
    fn test_seeded_streams() {
        let mode = RngMode::Seeded(9);
        assert_eq!(mode.draw_rng(3).next_u64(), mode.draw_rng(3).next_u64());
        assert_ne!(mode.draw_rng(3).next_u64(), mode.draw_rng(4).next_u64());
        assert_eq!(mode.training_seed(), 9);
        assert_eq!(NormalizationConfig { rng: mode, ..Default::default() }.seeded_forest().seed, 9);
    }
}
