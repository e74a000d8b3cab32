//! Bootstrap Normalization Engine
//!
//! For one sensor:
//!
//! 1. build the feature matrix and split off the pollutant target
//! 2. fit the model once on the complete rows
//! 3. predict `B + 1` times, each time resampling the bootstrap features
//!    with replacement
//! 4. average the draws per timestamp
//!
//! The mean is a Monte Carlo estimate of the pollutant level expected under
//! the empirical weather distribution, conditioned on calendar position. Its
//! standard error shrinks as 1/√B.

use crate::config::{NormalizationConfig, RngMode};
use crate::error::{NormalizeError, Result};
use normair_features::schema::{DATE, VALUE};
use normair_features::{FeatureBuilder, FeatureConfig, FeatureMatrix, TimeSeries};
use normair_model::{FeatureSelection, ModelKind, ScoringModel, build_model};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::debug;

/// Fits and runs the bootstrap normalization for one sensor's readings.
#[derive(Debug, Clone)]
pub struct NormalizationEngine {
    config: NormalizationConfig,
    builder: FeatureBuilder,
    kind: ModelKind,
    selection: FeatureSelection,
}

impl NormalizationEngine {
    /// Validate the configuration and create an engine.
    ///
    /// Fails for an unsupported model kind or an inconsistent selection.
    pub fn new(config: NormalizationConfig) -> Result<Self> {
        let kind = config.kind()?;
        let selection = config.selection()?;
        config.forest.validate()?;

        // one sensor per run, so identity indicators carry no information
        let builder = FeatureBuilder::new(FeatureConfig {
            sensor_dummies: false,
            ..config.features.clone()
        });

        Ok(Self {
            config,
            builder,
            kind,
            selection,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Feature selection of the normalization model.
    pub fn selection(&self) -> &FeatureSelection {
        &self.selection
    }

    /// Build features and fit the model on one sensor's readings.
    pub fn prepare(&self, observations: &DataFrame) -> Result<PreparedRun> {
        let matrix = self.builder.build(observations)?;
        let (features, target) = matrix.split_target(&self.config.target_column)?;

        let mut model = build_model(self.kind, self.selection.clone(), self.config.seeded_forest())?;
        model.fit(&features, &target)?;

        Ok(PreparedRun {
            features,
            target,
            model,
            rng: self.config.rng,
            parallel: self.config.parallel,
        })
    }

    /// Normalize one sensor's readings with the configured number of draws.
    pub fn normalize(&self, observations: &DataFrame) -> Result<NormalizedSeries> {
        self.prepare(observations)?
            .normalize(self.config.bootstrap_samples)
    }
}

/// A fitted model together with the features it predicts on.
#[derive(Debug)]
pub struct PreparedRun {
    features: FeatureMatrix,
    target: TimeSeries,
    model: Box<dyn ScoringModel>,
    rng: RngMode,
    parallel: bool,
}

impl PreparedRun {
    /// The fitted model.
    pub fn model(&self) -> &dyn ScoringModel {
        self.model.as_ref()
    }

    /// Features without the target.
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// Observed target values.
    pub fn target(&self) -> &TimeSeries {
        &self.target
    }

    /// Prediction on the observed features, without resampling.
    pub fn baseline(&self) -> Result<TimeSeries> {
        Ok(self.model.predict_baseline(&self.features)?)
    }

    /// Prediction draw `draw`, with its own generator.
    pub fn draw(&self, draw: u64) -> Result<TimeSeries> {
        let mut rng = self.rng.draw_rng(draw);
        Ok(self.model.predict(&self.features, &mut rng)?)
    }

    /// The first `count` prediction draws, in draw order.
    pub fn draws(&self, count: usize) -> Result<Vec<TimeSeries>> {
        if self.parallel {
            (0..count)
                .into_par_iter()
                .map(|i| self.draw(i as u64))
                .collect()
        } else {
            (0..count).map(|i| self.draw(i as u64)).collect()
        }
    }

    /// Average of `bootstrap_samples + 1` draws.
    pub fn normalize(&self, bootstrap_samples: usize) -> Result<NormalizedSeries> {
        let draws = bootstrap_samples + 1;
        let series = average_draws(self.draws(draws)?)?;
        debug!(rows = series.len(), draws, "normalized");
        Ok(NormalizedSeries { series, draws })
    }
}

/// Row-wise arithmetic mean of prediction draws sharing one index.
///
/// The mean is accumulated incrementally, so identical draws average to
/// exactly their common value. No draws, or draws over zero rows, give an
/// empty series.
pub fn average_draws(draws: impl IntoIterator<Item = TimeSeries>) -> Result<TimeSeries> {
    let mut draws = draws.into_iter();
    let Some(first) = draws.next() else {
        return Ok(TimeSeries::default());
    };
    let (index, mut mean) = first.into_parts();

    for (k, draw) in draws.enumerate() {
        if draw.index() != index.as_slice() {
            return Err(NormalizeError::MisalignedDraw { draw: k + 1 });
        }
        let count = (k + 2) as f64;
        for (m, v) in mean.iter_mut().zip(draw.values()) {
            *m += (v - *m) / count;
        }
    }
    Ok(TimeSeries::new(index, mean)?)
}

/// Normalized pollutant level per timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    series: TimeSeries,
    draws: usize,
}

impl NormalizedSeries {
    /// Wrap an averaged series.
    pub const fn new(series: TimeSeries, draws: usize) -> Self {
        Self { series, draws }
    }

    /// Normalized values by timestamp.
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    /// Number of averaged draws.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether no timestamp survived.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Frame with columns `data` and `valore`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        Ok(self.series.to_frame(DATE, VALUE)?)
    }
}
