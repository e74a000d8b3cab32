use super::{ForestConfig, RandomForest};
use crate::design::DesignMatrix;
use crate::error::{ModelError, Result};
use crate::kind::ModelKind;
use crate::model::ScoringModel;
use crate::resample::resample_columns;
use crate::selection::FeatureSelection;
use normair_features::{FeatureMatrix, TimeSeries};
use rand::RngCore;
use tracing::debug;

/// Random forest behind the [`ScoringModel`] contract.
///
/// Fitting and prediction see only the selected features and only rows where
/// all of them are present. When the selection names bootstrap features,
/// every [`ScoringModel::predict`] call resamples them jointly before
/// predicting.
#[derive(Debug, Clone)]
pub struct RandomForestModel {
    selection: FeatureSelection,
    forest: RandomForest,
}

impl RandomForestModel {
    /// Create an unfitted model.
    pub fn new(selection: FeatureSelection, config: ForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selection,
            forest: RandomForest::new(config),
        })
    }

    /// The underlying forest.
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    fn fitted_design(&self, x: &FeatureMatrix) -> Result<DesignMatrix> {
        if !self.forest.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        DesignMatrix::complete_rows(x, &self.selection)
    }
}

impl ScoringModel for RandomForestModel {
    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }

    fn selection(&self) -> &FeatureSelection {
        &self.selection
    }

    fn is_fitted(&self) -> bool {
        self.forest.is_fitted()
    }

    fn fit(&mut self, x: &FeatureMatrix, y: &TimeSeries) -> Result<()> {
        let design = DesignMatrix::complete_rows(x, &self.selection)?;

        // realign the target on the surviving timestamps
        let lookup = y.lookup();
        let targets: Vec<f64> = design
            .index()
            .iter()
            .map(|ts| lookup.get(ts).copied().unwrap_or(f64::NAN))
            .collect();
        let keep: Vec<bool> = targets.iter().map(|v| !v.is_nan()).collect();
        let design = design.retain(&keep);
        let targets: Vec<f64> = targets.into_iter().filter(|v| !v.is_nan()).collect();

        debug!(
            rows = design.nrows(),
            dropped = x.height() - design.nrows(),
            features = design.ncols(),
            "fitting random forest"
        );
        self.forest.fit(design.values().view(), &targets)
    }

    fn predict(&self, x: &FeatureMatrix, rng: &mut dyn RngCore) -> Result<TimeSeries> {
        let design = self.fitted_design(x)?;
        let predictions = if self.selection.is_bootstrap() {
            let resampled = resample_columns(design.values(), &self.selection.bootstrap_positions(), rng);
            self.forest.predict(resampled.view())
        } else {
            self.forest.predict(design.values().view())
        };
        Ok(TimeSeries::new(design.index().to_vec(), predictions)?)
    }

    fn predict_baseline(&self, x: &FeatureMatrix) -> Result<TimeSeries> {
        let design = self.fitted_design(x)?;
        let predictions = self.forest.predict(design.values().view());
        Ok(TimeSeries::new(design.index().to_vec(), predictions)?)
    }
}
