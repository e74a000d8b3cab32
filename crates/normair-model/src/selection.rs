//! Feature selection contract.
//!
//! A model sees only the columns named in its selection. A subset of those,
//! the bootstrap features, may be resampled at prediction time.

use crate::error::{ModelError, Result};
use normair_features::FeatureMatrix;
use normair_features::schema::{CALENDAR_COLUMNS, TIME_INDEX, date_columns};

/// Columns a model is fitted on, and which of them are resampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSelection {
    features: Vec<String>,
    bootstrap_features: Vec<String>,
}

impl FeatureSelection {
    /// Select `features`, with no resampling.
    pub fn new(features: Vec<String>) -> Self {
        Self {
            features,
            bootstrap_features: Vec::new(),
        }
    }

    /// Time index, every date column and the given weather covariates.
    ///
    /// The date columns include the weekday and month indicators.
    pub fn default_for(weather_columns: &[String]) -> Self {
        Self::with_calendar(date_columns(), weather_columns)
    }

    /// Time index, the compact calendar columns and the given weather
    /// covariates, without weekday or month indicators.
    pub fn compact_for(weather_columns: &[String]) -> Self {
        Self::with_calendar(CALENDAR_COLUMNS.to_vec(), weather_columns)
    }

    fn with_calendar(calendar: Vec<&str>, weather_columns: &[String]) -> Self {
        let features = std::iter::once(TIME_INDEX.to_string())
            .chain(calendar.into_iter().map(str::to_string))
            .chain(weather_columns.iter().cloned())
            .collect();
        Self::new(features)
    }

    /// Enable resampling of `bootstrap_features` at prediction time.
    ///
    /// Every bootstrap feature must be selected, and the time index can never
    /// be resampled.
    pub fn with_bootstrap(mut self, bootstrap_features: Vec<String>) -> Result<Self> {
        if bootstrap_features.iter().any(|f| f == TIME_INDEX) {
            return Err(ModelError::InvalidConfiguration(format!(
                "time index '{TIME_INDEX}' cannot be a bootstrap feature"
            )));
        }
        if let Some(unknown) = bootstrap_features
            .iter()
            .find(|f| !self.features.contains(f))
        {
            return Err(ModelError::InvalidConfiguration(format!(
                "bootstrap feature '{unknown}' is not a selected feature"
            )));
        }
        self.bootstrap_features = bootstrap_features;
        Ok(self)
    }

    /// The same selection with resampling switched off.
    pub fn without_bootstrap(&self) -> Self {
        Self::new(self.features.clone())
    }

    /// Selected feature names, in design-matrix column order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Names of the resampled features.
    pub fn bootstrap_features(&self) -> &[String] {
        &self.bootstrap_features
    }

    /// Whether predictions resample the bootstrap features.
    pub fn is_bootstrap(&self) -> bool {
        !self.bootstrap_features.is_empty()
    }

    /// Design-matrix column positions of the bootstrap features.
    pub fn bootstrap_positions(&self) -> Vec<usize> {
        self.bootstrap_features
            .iter()
            .filter_map(|b| self.features.iter().position(|f| f == b))
            .collect()
    }

    /// Fail if any selected feature is absent from `x`.
    pub fn check(&self, x: &FeatureMatrix) -> Result<()> {
        let missing = x.missing_columns(&self.features);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ModelError::FeatureSelection { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> Vec<String> {
        vec!["tmedia celsius".to_string(), "pioggia mm".to_string()]
    }

    #[test]
    fn test_default_selection_has_full_date_set() {
        let selection = FeatureSelection::default_for(&weather());
        let features = selection.features();
        assert_eq!(features.len(), 1 + date_columns().len() + 2);
        assert_eq!(features[0], TIME_INDEX);
        for name in ["year", "dayofyear", "Monday", "Sunday", "January", "December"] {
            assert!(features.iter().any(|f| f == name), "missing {name}");
        }
        assert_eq!(&features[features.len() - 2..], &weather()[..]);
        assert!(!selection.is_bootstrap());
    }

    #[test]
    fn test_compact_selection() {
        let selection = FeatureSelection::compact_for(&weather());
        assert_eq!(
            selection.features(),
            &["date_unix", "year", "day", "weekofyear", "dayofyear", "tmedia celsius", "pioggia mm"]
        );
        assert!(!selection.features().iter().any(|f| f == "Monday" || f == "January"));
    }

    #[test]
    fn test_bootstrap_positions() {
        let selection = FeatureSelection::compact_for(&weather())
            .with_bootstrap(vec!["pioggia mm".to_string(), "tmedia celsius".to_string()])
            .unwrap();
        assert!(selection.is_bootstrap());
        assert_eq!(selection.bootstrap_positions(), vec![6, 5]);

        let full = FeatureSelection::default_for(&weather())
            .with_bootstrap(vec!["tmedia celsius".to_string()])
            .unwrap();
        assert_eq!(full.bootstrap_positions(), vec![1 + date_columns().len()]);
        assert!(!selection.without_bootstrap().is_bootstrap());
    }

    #[test]
    fn test_time_index_never_resampled() {
        let result = FeatureSelection::default_for(&weather()).with_bootstrap(vec![TIME_INDEX.to_string()]);
        assert!(matches!(result, Err(ModelError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_unknown_bootstrap_feature() {
        let result = FeatureSelection::default_for(&weather()).with_bootstrap(vec!["neve".to_string()]);
        assert!(matches!(result, Err(ModelError::InvalidConfiguration(_))));
    }
}
