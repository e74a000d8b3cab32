//! Sensor Pipeline
//!
//! Runs the normalization engine independently for each sensor and
//! concatenates the normalized series, tagged with the sensor identifier.
//! Each sensor's fitted model lives only for its own iteration.
//!
//! A sensor that fails (missing feature, unusable timestamps, ...) is logged
//! and reported; the remaining sensors are still processed.

use crate::engine::{NormalizationEngine, NormalizedSeries};
use crate::error::{NormalizeError, Result};
use normair_features::schema::SENSOR_ID;
use normair_features::sensors::string_values;
use normair_features::TimeSeries;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Progress notification emitted after each sensor.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Sensor just processed
    pub sensor: &'a str,
    /// Sensors processed so far
    pub completed: usize,
    /// Sensors to process in total
    pub total: usize,
}

type ProgressObserver = Box<dyn Fn(Progress<'_>) + Send + Sync>;

/// Normalizes every sensor of a joined dataset.
pub struct SensorPipeline {
    engine: NormalizationEngine,
    sensors: Option<Vec<String>>,
    observer: Option<ProgressObserver>,
}

impl fmt::Debug for SensorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorPipeline")
            .field("engine", &self.engine)
            .field("sensors", &self.sensors)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Rows produced for one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSummary {
    /// Sensor identifier
    pub sensor: String,
    /// Number of normalized rows
    pub rows: usize,
}

/// A sensor that could not be normalized.
#[derive(Debug)]
pub struct SensorFailure {
    /// Sensor identifier
    pub sensor: String,
    /// Cause of the failure
    pub error: NormalizeError,
}

/// Outcome of a pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Concatenated output with columns `data`, `valore`, `idsensore`
    pub output: DataFrame,
    /// Sensors normalized, in processing order
    pub processed: Vec<SensorSummary>,
    /// Sensors skipped because of an error
    pub failures: Vec<SensorFailure>,
}

impl SensorPipeline {
    /// Create a pipeline over every sensor in the input.
    pub fn new(engine: NormalizationEngine) -> Self {
        Self {
            engine,
            sensors: None,
            observer: None,
        }
    }

    /// Restrict the run to the given sensors, in this order.
    pub fn with_sensors(mut self, sensors: Vec<String>) -> Self {
        self.sensors = Some(sensors);
        self
    }

    /// Notify `observer` after each sensor.
    pub fn with_progress(mut self, observer: impl Fn(Progress<'_>) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// The engine applied to each sensor.
    pub fn engine(&self) -> &NormalizationEngine {
        &self.engine
    }

    /// Normalize every selected sensor of `observations`.
    pub fn run(&self, observations: &DataFrame) -> Result<PipelineReport> {
        let column = &self.engine.config().sensor_column;
        let ids = string_values(observations, column)?;
        let sensors = match &self.sensors {
            Some(subset) => subset.clone(),
            None => sensor_ids(observations, column)?,
        };
        info!(sensors = sensors.len(), rows = observations.height(), "starting normalization");

        let completed = AtomicUsize::new(0);
        let run_one = |sensor: &String| {
            let result = self.run_sensor(observations, &ids, sensor);
            if let Some(observer) = &self.observer {
                observer(Progress {
                    sensor,
                    completed: completed.fetch_add(1, Ordering::Relaxed) + 1,
                    total: sensors.len(),
                });
            }
            result
        };
        let results: Vec<Result<NormalizedSeries>> = if self.engine.config().parallel {
            sensors.par_iter().map(run_one).collect()
        } else {
            sensors.iter().map(run_one).collect()
        };

        let mut output = tag_sensor(&NormalizedSeries::new(TimeSeries::default(), 0), "")?;
        let mut processed = Vec::new();
        let mut failures = Vec::new();
        for (sensor, result) in sensors.iter().zip(results) {
            match result.and_then(|series| Ok((tag_sensor(&series, sensor)?, series.len()))) {
                Ok((frame, rows)) => {
                    info!(sensor = %sensor, rows, "sensor normalized");
                    output.vstack_mut(&frame)?;
                    processed.push(SensorSummary {
                        sensor: sensor.clone(),
                        rows,
                    });
                }
                Err(error) => {
                    warn!(sensor = %sensor, %error, "sensor skipped");
                    failures.push(SensorFailure {
                        sensor: sensor.clone(),
                        error,
                    });
                }
            }
        }

        Ok(PipelineReport {
            output,
            processed,
            failures,
        })
    }

    fn run_sensor(&self, observations: &DataFrame, ids: &[Option<String>], sensor: &str) -> Result<NormalizedSeries> {
        let mask: Vec<bool> = ids.iter().map(|id| id.as_deref() == Some(sensor)).collect();
        let rows = observations.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
        self.engine.normalize(&rows)
    }
}

/// Distinct sensor identifiers of `column`, in order of first appearance.
pub fn sensor_ids(observations: &DataFrame, column: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    Ok(string_values(observations, column)?
        .into_iter()
        .flatten()
        .filter(|id| seen.insert(id.clone()))
        .collect())
}

/// A normalized series as `data`, `valore`, `idsensore`.
fn tag_sensor(series: &NormalizedSeries, sensor: &str) -> Result<DataFrame> {
    let mut frame = series.to_frame()?;
    let tags = vec![sensor; frame.height()];
    frame.with_column(Column::new(SENSOR_ID.into(), tags))?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_ids_first_appearance() {
        let df = DataFrame::new(vec![Column::new(
            SENSOR_ID.into(),
            [Some(30i64), Some(10), None, Some(30), Some(20)],
        )])
        .unwrap();
        assert_eq!(sensor_ids(&df, SENSOR_ID).unwrap(), vec!["30", "10", "20"]);
    }

    #[test]
    fn test_sensor_ids_missing_column() {
        let df = DataFrame::new(vec![Column::new("other".into(), ["a"])]).unwrap();
        assert!(matches!(sensor_ids(&df, SENSOR_ID), Err(NormalizeError::Feature(_))));
    }

    #[test]
    fn test_tag_sensor_schema() {
        let empty = tag_sensor(&NormalizedSeries::new(TimeSeries::default(), 0), "x").unwrap();
        assert_eq!(empty.shape(), (0, 3));
        assert_eq!(empty.column(SENSOR_ID).unwrap().dtype(), &DataType::String);
    }
}
