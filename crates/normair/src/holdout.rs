//! Year holdout evaluation of the normalization model.
//!
//! Fits the model without resampling on every row up to and including the
//! test year and compares its predictions for the test year with the
//! observed values.

use crate::config::NormalizationConfig;
use crate::error::Result;
use chrono::Datelike;
use normair_features::schema::DATE;
use normair_features::timestamps::timestamp_column;
use normair_features::{FeatureBuilder, FeatureMatrix, TimeSeries};
use normair_model::{FeatureSelection, TimeSeriesMetrics, build_model};
use polars::prelude::*;
use tracing::info;

/// Train and test partitions of a feature matrix and its target.
#[derive(Debug, Clone)]
pub struct HoldoutSplit {
    /// Training features: rows with year ≤ test year
    pub train_x: FeatureMatrix,
    /// Training target
    pub train_y: TimeSeries,
    /// Test features: rows of the test year
    pub test_x: FeatureMatrix,
    /// Test target
    pub test_y: TimeSeries,
}

/// Split rows by calendar year of their timestamp.
pub fn year_split(x: &FeatureMatrix, y: &TimeSeries, test_year: i32) -> Result<HoldoutSplit> {
    let train_mask: Vec<bool> = x.index().iter().map(|ts| ts.year() <= test_year).collect();
    let test_mask: Vec<bool> = x.index().iter().map(|ts| ts.year() == test_year).collect();
    Ok(HoldoutSplit {
        train_x: x.filter_rows(&train_mask)?,
        train_y: filter_series(y, |year| year <= test_year)?,
        test_x: x.filter_rows(&test_mask)?,
        test_y: filter_series(y, |year| year == test_year)?,
    })
}

fn filter_series(y: &TimeSeries, keep: impl Fn(i32) -> bool) -> Result<TimeSeries> {
    let (index, values) = y.iter().filter(|(ts, _)| keep(ts.year())).map(|(ts, v)| (*ts, v)).unzip();
    Ok(TimeSeries::new(index, values)?)
}

/// Outcome of a holdout evaluation.
#[derive(Debug, Clone)]
pub struct HoldoutReport {
    /// Columns `data`, `test` (observed) and `pred` (null where no prediction)
    pub comparison: DataFrame,
    /// Metrics over the test rows that received a prediction
    pub metrics: TimeSeriesMetrics,
}

/// Fit on the training years and score the test year.
pub fn evaluate(config: &NormalizationConfig, observations: &DataFrame, test_year: i32) -> Result<HoldoutReport> {
    let kind = config.kind()?;
    let matrix = FeatureBuilder::new(config.features.clone()).build(observations)?;
    let (x, y) = matrix.split_target(&config.target_column)?;
    let split = year_split(&x, &y, test_year)?;

    let selection = FeatureSelection::default_for(&config.weather_columns);
    let mut model = build_model(kind, selection, config.seeded_forest())?;
    model.fit(&split.train_x, &split.train_y)?;
    let predicted = model.predict_baseline(&split.test_x)?;

    let metrics = TimeSeriesMetrics::compute(&split.test_y, &predicted);
    info!(test_year, rows = split.test_y.len(), mape = metrics.mape, "holdout evaluated");

    Ok(HoldoutReport {
        comparison: comparison_frame(&split.test_y, &predicted)?,
        metrics,
    })
}

/// Observed values left-joined with predictions on timestamp.
fn comparison_frame(test: &TimeSeries, predicted: &TimeSeries) -> Result<DataFrame> {
    let lookup = predicted.lookup();
    let pred: Vec<Option<f64>> = test.index().iter().map(|ts| lookup.get(ts).copied()).collect();
    Ok(DataFrame::new(vec![
        timestamp_column(DATE, test.index())?,
        Column::new("test".into(), test.values().to_vec()),
        Column::new("pred".into(), pred),
    ])?)
}
