//! Feature Builder
//!
//! Turns a joined observation table into a [`FeatureMatrix`]:
//!
//! 1. optional sensor-identity indicators
//! 2. weather-event indicators
//! 3. calendar features
//! 4. harmonic seasonality features
//! 5. numeric-column filter
//!
//! An event token named like an input, calendar or harmonic column is skipped.
//! The transformation is deterministic and has no side effects; a table with
//! zero rows yields a zero-row matrix.

use crate::calendar::calendar_columns;
use crate::error::Result;
use crate::harmonics::{
    HarmonicSpec, HarmonicUnit, default_epoch, default_harmonics, harmonic_columns,
};
use crate::matrix::FeatureMatrix;
use crate::schema::{DATE, PHENOMENA, SENSOR_IDENTITY_COLUMNS};
use crate::sensors::sensor_dummy_columns;
use crate::timestamps::extract_timestamps;
use crate::weather::EventVocabulary;
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for feature construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Harmonic (period, count) entries
    pub harmonics: Vec<HarmonicSpec>,
    /// Unit of the harmonic periods
    pub harmonic_unit: HarmonicUnit,
    /// Reference epoch for harmonic phase
    pub epoch: NaiveDateTime,
    /// Expand sensor identity columns into indicators
    pub sensor_dummies: bool,
    /// Event vocabulary to use instead of deriving one from the input
    pub vocabulary: Option<EventVocabulary>,
    /// Timestamp column
    pub date_column: String,
    /// Free-text phenomena column
    pub phenomena_column: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            harmonics: default_harmonics(),
            harmonic_unit: HarmonicUnit::default(),
            epoch: default_epoch(),
            sensor_dummies: false,
            vocabulary: None,
            date_column: DATE.to_string(),
            phenomena_column: PHENOMENA.to_string(),
        }
    }
}

/// Builds feature matrices from observation tables.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// The builder's configuration.
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// The event vocabulary used for `df`: the configured one if any,
    /// otherwise the one derived from `df` itself.
    pub fn vocabulary(&self, df: &DataFrame) -> Result<EventVocabulary> {
        match &self.config.vocabulary {
            Some(vocabulary) => Ok(vocabulary.clone()),
            None => EventVocabulary::from_frame(df, &self.config.phenomena_column),
        }
    }

    /// Build the feature matrix for an observation table.
    pub fn build(&self, df: &DataFrame) -> Result<FeatureMatrix> {
        let config = &self.config;
        let timestamps = extract_timestamps(df, &config.date_column)?;
        let mut frame = df.clone();

        if config.sensor_dummies {
            let dummies = sensor_dummy_columns(df, &SENSOR_IDENTITY_COLUMNS)?;
            for name in SENSOR_IDENTITY_COLUMNS {
                frame = frame.drop(name)?;
            }
            for column in dummies {
                frame.with_column(column)?;
            }
        }

        let mut generated = calendar_columns(&timestamps);
        generated.extend(harmonic_columns(
            &timestamps,
            &config.harmonics,
            &config.epoch,
            config.harmonic_unit,
        )?);

        let vocabulary = self.vocabulary(df)?;
        debug!(tokens = vocabulary.len(), "weather event vocabulary");
        for column in vocabulary.indicator_columns(df, &config.phenomena_column)? {
            let name = column.name();
            if frame.column(name).is_ok() || generated.iter().any(|g| g.name() == name) {
                warn!(token = %name, "event token collides with an existing column, skipped");
                continue;
            }
            frame.with_column(column)?;
        }

        for column in generated {
            frame.with_column(column)?;
        }

        let frame = select_numeric_columns(&frame.drop(&config.date_column)?)?;
        debug!(rows = frame.height(), columns = frame.width(), "features built");
        FeatureMatrix::new(timestamps, frame)
    }
}

/// Keep integer, float and boolean columns; booleans become `Int32`.
pub fn select_numeric_columns(df: &DataFrame) -> Result<DataFrame> {
    let mut columns = Vec::new();
    for column in df.get_columns() {
        let dtype = column.dtype();
        if dtype.is_bool() {
            columns.push(column.cast(&DataType::Int32)?);
        } else if dtype.is_integer() || dtype.is_float() {
            columns.push(column.clone());
        }
    }
    Ok(DataFrame::new(columns)?)
}
