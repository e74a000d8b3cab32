//! Scoring Model Contract
//!
//! A scoring model is fitted once on a feature matrix and a target series,
//! then predicts one value per complete row of any matrix carrying the same
//! features. Randomness used at prediction time is supplied by the caller so
//! that draws can be seeded and run on independent threads.

use crate::error::Result;
use crate::forest::{ForestConfig, RandomForestModel};
use crate::kind::ModelKind;
use crate::metrics::TimeSeriesMetrics;
use crate::selection::FeatureSelection;
use normair_features::{FeatureMatrix, TimeSeries};
use rand::RngCore;
use std::fmt::Debug;

/// Fit / predict / score capability shared by every model kind.
pub trait ScoringModel: Debug + Send + Sync {
    /// The kind of this model.
    fn kind(&self) -> ModelKind;

    /// Features the model is fitted on, and which of them are resampled.
    fn selection(&self) -> &FeatureSelection;

    /// Whether the model has been fitted.
    fn is_fitted(&self) -> bool;

    /// Fit on `x` and `y`, aligned by timestamp.
    ///
    /// Rows missing any selected feature, and rows whose target is missing,
    /// are excluded. Fails when a selected feature is absent from `x`.
    fn fit(&mut self, x: &FeatureMatrix, y: &TimeSeries) -> Result<()>;

    /// Predict one value per complete row of `x`, resampling the bootstrap
    /// features with `rng` when the selection asks for it.
    fn predict(&self, x: &FeatureMatrix, rng: &mut dyn RngCore) -> Result<TimeSeries>;

    /// Predict one value per complete row of `x` without any resampling.
    fn predict_baseline(&self, x: &FeatureMatrix) -> Result<TimeSeries>;

    /// Predict `x` and compare against `y`.
    fn score(&self, x: &FeatureMatrix, y: &TimeSeries, rng: &mut dyn RngCore) -> Result<TimeSeriesMetrics> {
        let predicted = self.predict(x, rng)?;
        Ok(TimeSeriesMetrics::compute(y, &predicted))
    }
}

/// Construct an unfitted model of the given kind.
pub fn build_model(
    kind: ModelKind,
    selection: FeatureSelection,
    forest: ForestConfig,
) -> Result<Box<dyn ScoringModel>> {
    match kind {
        ModelKind::RandomForest => Ok(Box::new(RandomForestModel::new(selection, forest)?)),
    }
}
